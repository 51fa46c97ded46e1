//! Cart repository
//!
//! Carts are created lazily on first access and owned by exactly one
//! user. Adding a variant already in the cart merges quantities.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{Cart, CartLine};
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch the user's cart, creating an empty one if none exists yet.
    pub async fn get_or_create(&self, user_id: &str) -> AppResult<Cart> {
        if let Some(cart) = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at FROM carts WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        {
            return Ok(cart);
        }

        let cart = Cart {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        // Another request may create the cart first; the UNIQUE(user_id)
        // constraint decides, and we re-read on conflict.
        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO carts (id, user_id, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(&cart.id)
        .bind(&cart.user_id)
        .bind(cart.created_at)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 1 {
            Ok(cart)
        } else {
            let cart = sqlx::query_as::<_, Cart>(
                "SELECT id, user_id, created_at FROM carts WHERE user_id = ?1",
            )
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(cart)
        }
    }

    /// Cart lines joined with current catalog price and name
    pub async fn lines(&self, user_id: &str) -> AppResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            "SELECT ci.id AS item_id, pv.id AS variant_id, pv.sku, pv.product_name, \
                    pv.unit_price, ci.quantity \
             FROM cart_items ci \
             JOIN carts c ON ci.cart_id = c.id \
             JOIN product_variants pv ON ci.variant_id = pv.id \
             WHERE c.user_id = ?1 \
             ORDER BY ci.added_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    /// Add a variant to the cart, merging quantity if already present.
    /// The variant's existence is the caller's concern (catalog check).
    pub async fn add_item(&self, user_id: &str, variant_id: &str, quantity: i64) -> AppResult<()> {
        let cart = self.get_or_create(user_id).await?;

        sqlx::query(
            "INSERT INTO cart_items (id, cart_id, variant_id, quantity, added_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT (cart_id, variant_id) \
             DO UPDATE SET quantity = quantity + excluded.quantity",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&cart.id)
        .bind(variant_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Set an item's quantity. The item must belong to the user's cart.
    pub async fn update_item(&self, user_id: &str, item_id: &str, quantity: i64) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = ?1 \
             WHERE id = ?2 AND cart_id IN (SELECT id FROM carts WHERE user_id = ?3)",
        )
        .bind(quantity)
        .bind(item_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Cart item {item_id}")));
        }
        Ok(())
    }

    pub async fn remove_item(&self, user_id: &str, item_id: &str) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM cart_items \
             WHERE id = ?1 AND cart_id IN (SELECT id FROM carts WHERE user_id = ?2)",
        )
        .bind(item_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Cart item {item_id}")));
        }
        Ok(())
    }

    /// Remove every item from the user's cart
    pub async fn clear(&self, user_id: &str) -> AppResult<()> {
        sqlx::query(
            "DELETE FROM cart_items \
             WHERE cart_id IN (SELECT id FROM carts WHERE user_id = ?1)",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
