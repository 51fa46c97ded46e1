//! Inventory Manager
//!
//! Owns the stock-quantity invariants per sellable variant:
//! `0 <= reserved <= stock`, so `available = stock - reserved` never
//! goes negative. The four operations here are the only legal mutators
//! of stock fields; every mutation lands in the audit trail.
//!
//! Reservation must survive concurrent callers racing for the last
//! unit, possibly across replicas, so each check-and-update is a single
//! conditional UPDATE with the guard in the WHERE clause — never a
//! read followed by a write.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::audit::{AuditAction, AuditRecorder};
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct InventoryManager {
    pool: SqlitePool,
    audit: AuditRecorder,
}

impl InventoryManager {
    pub fn new(pool: SqlitePool, audit: AuditRecorder) -> Self {
        Self { pool, audit }
    }

    /// Place a hold of `qty` units against available stock.
    ///
    /// Atomic: succeeds and increments `reserved` only when
    /// `stock - reserved >= qty` held at update time; otherwise fails
    /// with `InsufficientStock` and changes nothing.
    pub async fn reserve(&self, variant_id: &str, qty: i64, actor: &str) -> AppResult<()> {
        if qty < 1 {
            return Err(AppError::validation("Reservation quantity must be >= 1"));
        }

        // Hold and audit entry commit together: a failed audit insert
        // rolls the hold back, so no untracked reservation can leak.
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE product_variants \
             SET reserved_quantity = reserved_quantity + ?1, updated_at = ?2 \
             WHERE id = ?3 AND stock_quantity - reserved_quantity >= ?1",
        )
        .bind(qty)
        .bind(Utc::now())
        .bind(variant_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return match self.exists(variant_id).await? {
                false => Err(AppError::not_found(format!("Variant {variant_id}"))),
                true => Err(AppError::InsufficientStock {
                    variant_id: variant_id.to_string(),
                }),
            };
        }

        self.audit
            .record_in(
                &mut tx,
                actor,
                AuditAction::StockReserved,
                "variant",
                variant_id,
                serde_json::json!({ "quantity": qty }),
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Give a hold back, floored at zero. Used when an order is
    /// cancelled (or checkout compensates) before stock was committed.
    pub async fn release(&self, variant_id: &str, qty: i64, actor: &str) -> AppResult<()> {
        if qty < 1 {
            return Err(AppError::validation("Release quantity must be >= 1"));
        }

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE product_variants \
             SET reserved_quantity = MAX(reserved_quantity - ?1, 0), updated_at = ?2 \
             WHERE id = ?3",
        )
        .bind(qty)
        .bind(Utc::now())
        .bind(variant_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::not_found(format!("Variant {variant_id}")));
        }

        self.audit
            .record_in(
                &mut tx,
                actor,
                AuditAction::StockReleased,
                "variant",
                variant_id,
                serde_json::json!({ "quantity": qty }),
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Convert a reservation into a permanent stock decrement.
    ///
    /// Idempotent per (order, variant): the `inventory_commits` primary
    /// key records each commit, so a replayed payment callback finds
    /// the marker and does nothing.
    pub async fn commit(
        &self,
        order_id: &str,
        variant_id: &str,
        qty: i64,
        actor: &str,
    ) -> AppResult<()> {
        if qty < 1 {
            return Err(AppError::validation("Commit quantity must be >= 1"));
        }

        let mut tx = self.pool.begin().await?;

        let marker = sqlx::query(
            "INSERT OR IGNORE INTO inventory_commits (order_id, variant_id, quantity, committed_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(order_id)
        .bind(variant_id)
        .bind(qty)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if marker.rows_affected() == 0 {
            // Already committed for this order+variant
            tx.rollback().await?;
            return Ok(());
        }

        let result = sqlx::query(
            "UPDATE product_variants \
             SET stock_quantity = stock_quantity - ?1, \
                 reserved_quantity = MAX(reserved_quantity - ?1, 0), \
                 updated_at = ?2 \
             WHERE id = ?3 AND stock_quantity >= ?1",
        )
        .bind(qty)
        .bind(Utc::now())
        .bind(variant_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::InsufficientStock {
                variant_id: variant_id.to_string(),
            });
        }

        self.audit
            .record_in(
                &mut tx,
                actor,
                AuditAction::StockCommitted,
                "variant",
                variant_id,
                serde_json::json!({ "order_id": order_id, "quantity": qty }),
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Admin-only absolute stock correction. Rejects any delta that
    /// would leave stock negative or below the reserved count.
    pub async fn adjust(
        &self,
        variant_id: &str,
        delta: i64,
        reason: &str,
        actor: &str,
    ) -> AppResult<i64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE product_variants \
             SET stock_quantity = stock_quantity + ?1, updated_at = ?2 \
             WHERE id = ?3 \
               AND stock_quantity + ?1 >= 0 \
               AND stock_quantity + ?1 >= reserved_quantity",
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(variant_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return match self.exists(variant_id).await? {
                false => Err(AppError::not_found(format!("Variant {variant_id}"))),
                true => Err(AppError::InsufficientStock {
                    variant_id: variant_id.to_string(),
                }),
            };
        }

        self.audit
            .record_in(
                &mut tx,
                actor,
                AuditAction::StockAdjusted,
                "variant",
                variant_id,
                serde_json::json!({ "delta": delta, "reason": reason }),
            )
            .await?;

        tx.commit().await?;

        let new_stock: i64 =
            sqlx::query_scalar("SELECT stock_quantity FROM product_variants WHERE id = ?1")
                .bind(variant_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(new_stock)
    }

    /// Has stock for this (order, variant) already been committed?
    pub async fn is_committed(&self, order_id: &str, variant_id: &str) -> AppResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM inventory_commits WHERE order_id = ?1 AND variant_id = ?2",
        )
        .bind(order_id)
        .bind(variant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    async fn exists(&self, variant_id: &str) -> AppResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM product_variants WHERE id = ?1")
                .bind(variant_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }
}
