//! Payment Gateway Adapter
//!
//! The external payment processor lives behind [`PaymentGateway`]; the
//! core never embeds gateway wire formats outside this module. The HTTP
//! implementation targets a Razorpay-style REST API with basic auth and
//! a bounded request deadline — a timeout is a transient failure the
//! caller retries, never an assumed success.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::AppError;

/// Gateway-side view of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayPaymentStatus {
    Created,
    Authorized,
    /// Funds collected, not merely authorized
    Captured,
    Failed,
    Refunded,
}

impl GatewayPaymentStatus {
    pub fn is_captured(self) -> bool {
        self == GatewayPaymentStatus::Captured
    }
}

/// A freshly opened payment intent
#[derive(Debug, Clone)]
pub struct GatewayIntent {
    pub intent_id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Deadline exceeded; outcome unknown, retry with backoff
    #[error("gateway request timed out")]
    Timeout,

    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    #[error("gateway rejected request: {0}")]
    Rejected(String),
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Timeout | GatewayError::Unavailable(_) => {
                AppError::ExternalService(e.to_string())
            }
            GatewayError::Rejected(msg) => AppError::validation(msg),
        }
    }
}

/// The verify-callback contract the core consumes
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open an intent for `amount` minor units, tagged with our order
    /// reference.
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        reference: &str,
    ) -> Result<GatewayIntent, GatewayError>;

    /// Authoritative status for a gateway payment. This is the only
    /// status the verifier trusts.
    async fn fetch_status(
        &self,
        gateway_payment_id: &str,
    ) -> Result<GatewayPaymentStatus, GatewayError>;

    /// Refund a captured payment, full amount when `amount` is None.
    /// Returns the gateway refund id.
    async fn refund(
        &self,
        gateway_payment_id: &str,
        amount: Option<i64>,
    ) -> Result<String, GatewayError>;
}

// ========== HTTP implementation ==========

#[derive(Serialize)]
struct CreateIntentBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Deserialize)]
struct IntentResponse {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Deserialize)]
struct PaymentResponse {
    status: GatewayPaymentStatus,
}

#[derive(Serialize)]
struct RefundBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<i64>,
}

#[derive(Deserialize)]
struct RefundResponse {
    id: String,
}

pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl HttpPaymentGateway {
    /// Build a gateway client with the configured request deadline.
    /// Errors instead of falling back to an unbounded client.
    pub fn new(
        base_url: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build gateway client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        })
    }

    fn map_error(e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout
        } else if e.is_connect() {
            GatewayError::Unavailable(e.to_string())
        } else {
            GatewayError::Rejected(e.to_string())
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        if response.status().is_success() {
            Ok(response)
        } else if response.status().is_server_error() {
            Err(GatewayError::Unavailable(format!(
                "gateway returned {}",
                response.status()
            )))
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(GatewayError::Rejected(format!("{status}: {body}")))
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        reference: &str,
    ) -> Result<GatewayIntent, GatewayError> {
        let response = self
            .client
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateIntentBody {
                amount,
                currency,
                receipt: reference,
            })
            .send()
            .await
            .map_err(Self::map_error)?;

        let body: IntentResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(Self::map_error)?;

        Ok(GatewayIntent {
            intent_id: body.id,
            amount: body.amount,
            currency: body.currency,
        })
    }

    async fn fetch_status(
        &self,
        gateway_payment_id: &str,
    ) -> Result<GatewayPaymentStatus, GatewayError> {
        let response = self
            .client
            .get(format!(
                "{}/v1/payments/{gateway_payment_id}",
                self.base_url
            ))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(Self::map_error)?;

        let body: PaymentResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(Self::map_error)?;

        Ok(body.status)
    }

    async fn refund(
        &self,
        gateway_payment_id: &str,
        amount: Option<i64>,
    ) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(format!(
                "{}/v1/payments/{gateway_payment_id}/refund",
                self.base_url
            ))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&RefundBody { amount })
            .send()
            .await
            .map_err(Self::map_error)?;

        let body: RefundResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(Self::map_error)?;

        Ok(body.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_with_deadline() {
        let gateway = HttpPaymentGateway::new(
            "https://gateway.example",
            "key",
            "secret",
            Duration::from_millis(500),
        );
        assert!(gateway.is_ok());
    }

    #[test]
    fn gateway_errors_map_to_app_errors() {
        assert!(matches!(
            AppError::from(GatewayError::Timeout),
            AppError::ExternalService(_)
        ));
        assert!(matches!(
            AppError::from(GatewayError::Rejected("bad amount".into())),
            AppError::Validation(_)
        ));
    }
}
