//! The audit log is append-only and hash-chained; any in-place edit
//! must be detectable.

mod common;

use commerce_server::audit::AuditAction;
use common::TestCtx;

#[tokio::test]
async fn untouched_chain_verifies_clean() {
    let ctx = TestCtx::new().await;
    for i in 0..5 {
        ctx.state
            .audit
            .record(
                "admin_1",
                AuditAction::StockAdjusted,
                "variant",
                &format!("v{i}"),
                serde_json::json!({ "delta": i }),
            )
            .await
            .unwrap();
    }

    assert_eq!(ctx.state.audit.verify_chain().await.unwrap(), None);
}

#[tokio::test]
async fn tampered_entry_breaks_the_chain_at_its_seq() {
    let ctx = TestCtx::new().await;
    for i in 0..5 {
        ctx.state
            .audit
            .record(
                "admin_1",
                AuditAction::StockAdjusted,
                "variant",
                &format!("v{i}"),
                serde_json::json!({ "delta": i }),
            )
            .await
            .unwrap();
    }

    // Rewrite the third entry's payload behind the recorder's back
    sqlx::query("UPDATE audit_log SET details = '{\"delta\":999}' WHERE seq = 3")
        .execute(ctx.state.db.pool())
        .await
        .unwrap();

    assert_eq!(ctx.state.audit.verify_chain().await.unwrap(), Some(3));
}

#[tokio::test]
async fn entries_are_scoped_per_entity() {
    let ctx = TestCtx::new().await;
    ctx.seed_variant("v1", 1_000, 10).await;

    let inventory = ctx.state.inventory();
    inventory.reserve("v1", 2, "alice").await.unwrap();
    inventory.release("v1", 2, "alice").await.unwrap();

    let entries = ctx
        .state
        .audit
        .entries_for("variant", "v1")
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, AuditAction::StockReserved);
    assert_eq!(entries[1].action, AuditAction::StockReleased);
}
