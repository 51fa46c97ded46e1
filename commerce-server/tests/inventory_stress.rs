//! Concurrent reservation behavior: available stock never goes
//! negative no matter how many callers race for it.

mod common;

use commerce_server::utils::AppError;
use common::TestCtx;

#[tokio::test]
async fn concurrent_reservations_never_oversell() {
    let ctx = TestCtx::new().await;
    ctx.seed_variant("hot", 1_000, 5).await;

    let mut handles = Vec::new();
    for i in 0..20 {
        let inventory = ctx.state.inventory();
        handles.push(tokio::spawn(async move {
            inventory.reserve("hot", 1, &format!("user_{i}")).await
        }));
    }

    let mut won = 0;
    let mut lost = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(()) => won += 1,
            Err(AppError::InsufficientStock { .. }) => lost += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(won, 5);
    assert_eq!(lost, 15);
    assert_eq!(ctx.stock_of("hot").await, (5, 5));
}

#[tokio::test]
async fn release_never_drives_reserved_negative() {
    let ctx = TestCtx::new().await;
    ctx.seed_variant("v1", 1_000, 10).await;

    let inventory = ctx.state.inventory();
    inventory.reserve("v1", 2, "alice").await.unwrap();
    // Over-release floors at zero rather than corrupting the counter
    inventory.release("v1", 5, "alice").await.unwrap();
    assert_eq!(ctx.stock_of("v1").await, (10, 0));
}

#[tokio::test]
async fn commit_is_idempotent_per_order_line() {
    let ctx = TestCtx::new().await;
    ctx.seed_variant("v1", 1_000, 10).await;
    ctx.add_to_cart("alice", "v1", 3).await;
    let order_id = ctx
        .state
        .checkout_orchestrator()
        .checkout(
            "alice",
            commerce_server::orders::CheckoutRequest {
                shipping_address_id: None,
                billing_address_id: None,
                coupon_code: None,
                notes: None,
            },
        )
        .await
        .unwrap()
        .order_id;

    let inventory = ctx.state.inventory();
    for _ in 0..3 {
        inventory.commit(&order_id, "v1", 3, "system").await.unwrap();
    }
    assert_eq!(ctx.stock_of("v1").await, (7, 0));
}

#[tokio::test]
async fn reservation_rolls_back_when_its_audit_entry_cannot_be_written() {
    let ctx = TestCtx::new().await;
    ctx.seed_variant("v1", 1_000, 10).await;

    // The hold and its audit entry share a transaction; if the entry
    // cannot be written the hold must not survive either.
    sqlx::query("DROP TABLE audit_log")
        .execute(ctx.state.db.pool())
        .await
        .unwrap();

    let result = ctx.state.inventory().reserve("v1", 3, "alice").await;
    assert!(result.is_err());
    assert_eq!(ctx.stock_of("v1").await, (10, 0));
}

#[tokio::test]
async fn adjustment_cannot_take_stock_below_reservations() {
    let ctx = TestCtx::new().await;
    ctx.seed_variant("v1", 1_000, 10).await;

    let inventory = ctx.state.inventory();
    inventory.reserve("v1", 4, "alice").await.unwrap();

    // 10 - 7 = 3 < 4 reserved, must be refused
    let err = inventory
        .adjust("v1", -7, "shrinkage", "admin_1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { .. }));
    assert_eq!(ctx.stock_of("v1").await, (10, 4));

    // A correction that respects reservations goes through
    let new_stock = inventory
        .adjust("v1", -6, "shrinkage", "admin_1")
        .await
        .unwrap();
    assert_eq!(new_stock, 4);
    assert_eq!(ctx.stock_of("v1").await, (4, 4));
}
