//! Payment repository
//!
//! Payment rows are written by the verifier only and never deleted.
//! The UNIQUE constraints on `intent_id` and `gateway_payment_id` are
//! the store-level idempotency keys for callback replays.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::Payment;
use crate::orders::state_machine::PaymentState;
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a freshly opened intent, status pending.
    pub async fn create_intent(
        &self,
        order_id: &str,
        intent_id: &str,
        amount: i64,
        currency: &str,
    ) -> AppResult<Payment> {
        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            intent_id: intent_id.to_string(),
            gateway_payment_id: None,
            signature: None,
            amount,
            currency: currency.to_string(),
            payment_status: PaymentState::Pending,
            verified: false,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO payments \
             (id, order_id, intent_id, amount, currency, payment_status, verified, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, 'pending', 0, ?6, ?6)",
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(&payment.intent_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(payment)
    }

    pub async fn find_by_intent(&self, intent_id: &str) -> AppResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE intent_id = ?1",
        )
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payment)
    }

    pub async fn find_by_gateway_payment(
        &self,
        gateway_payment_id: &str,
    ) -> AppResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE gateway_payment_id = ?1",
        )
        .bind(gateway_payment_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payment)
    }

    /// Any verified payment already attached to this order?
    pub async fn find_verified_for_order(&self, order_id: &str) -> AppResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE order_id = ?1 AND verified = 1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payment)
    }

    /// Mark a payment verified and completed, binding the gateway
    /// payment id and signature. The UNIQUE index on
    /// `gateway_payment_id` rejects the same gateway payment being
    /// applied to a second intent.
    pub async fn mark_verified(
        &self,
        intent_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE payments \
             SET gateway_payment_id = ?1, signature = ?2, payment_status = 'completed', \
                 verified = 1, updated_at = ?3 \
             WHERE intent_id = ?4 \
               AND (gateway_payment_id IS NULL OR gateway_payment_id = ?1)",
        )
        .bind(gateway_payment_id)
        .bind(signature)
        .bind(Utc::now())
        .bind(intent_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicatePayment,
            _ => AppError::from(e),
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::DuplicatePayment);
        }
        Ok(())
    }

    /// Record the authoritative gateway outcome for an unverified
    /// payment (e.g. failed), leaving `verified` untouched.
    pub async fn mark_status(&self, intent_id: &str, status: PaymentState) -> AppResult<()> {
        sqlx::query(
            "UPDATE payments SET payment_status = ?1, updated_at = ?2 WHERE intent_id = ?3",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(intent_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn mark_refunded(&self, gateway_payment_id: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE payments SET payment_status = 'refunded', updated_at = ?1 \
             WHERE gateway_payment_id = ?2",
        )
        .bind(Utc::now())
        .bind(gateway_payment_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
