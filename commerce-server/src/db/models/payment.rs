//! Payment model
//!
//! One row per attempted payment intent. Rows are created when an
//! intent is requested, mutated only by the payment verifier, and
//! never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::orders::state_machine::PaymentState;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    /// Gateway-assigned intent identifier
    pub intent_id: String,
    /// Gateway-assigned payment identifier, unique once set
    pub gateway_payment_id: Option<String>,
    /// Signature received with the callback (stored for audit)
    pub signature: Option<String>,
    /// Amount in minor units
    pub amount: i64,
    pub currency: String,
    pub payment_status: PaymentState,
    /// Set only after the callback signature checked out
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
