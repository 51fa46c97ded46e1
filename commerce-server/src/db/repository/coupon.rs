//! Coupon repository

use sqlx::SqlitePool;

use crate::db::models::Coupon;
use crate::utils::AppResult;

#[derive(Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up a coupon by code. Applicability (window, minimum,
    /// usage cap) is the pricing engine's call, not the lookup's.
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(
            "SELECT id, code, discount_type, discount_value, min_purchase_amount, \
                    max_uses, current_uses, valid_from, valid_until, is_active, created_at \
             FROM coupons WHERE code = ?1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(coupon)
    }

    /// Count one redemption, guarded by the usage cap. Returns whether
    /// the counter moved. Called by the checkout orchestrator only
    /// after the order is durably created, so retries before that point
    /// never double-count.
    pub async fn redeem(&self, code: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE coupons SET current_uses = current_uses + 1 \
             WHERE code = ?1 AND (max_uses IS NULL OR current_uses < max_uses)",
        )
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
