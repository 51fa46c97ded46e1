//! Shared test fixtures: a scratch SQLite database, a programmable
//! in-process payment gateway, and seed helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;

use commerce_server::core::{Config, ServerState};
use commerce_server::db::DbService;
use commerce_server::payments::{
    GatewayError, GatewayIntent, GatewayPaymentStatus, PaymentGateway, SignatureScheme,
};

/// Gateway double. Every created intent is remembered; payment status
/// is whatever the test programs, defaulting to captured.
pub struct MockGateway {
    counter: AtomicU64,
    pub statuses: Mutex<HashMap<String, GatewayPaymentStatus>>,
    pub fail_create: Mutex<Option<GatewayError>>,
    pub created: Mutex<Vec<GatewayIntent>>,
    pub refunds: Mutex<Vec<(String, Option<i64>)>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            statuses: Mutex::new(HashMap::new()),
            fail_create: Mutex::new(None),
            created: Mutex::new(Vec::new()),
            refunds: Mutex::new(Vec::new()),
        }
    }

    pub fn set_status(&self, gateway_payment_id: &str, status: GatewayPaymentStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert(gateway_payment_id.to_string(), status);
    }

    pub fn fail_next_create(&self, err: GatewayError) {
        *self.fail_create.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        _reference: &str,
    ) -> Result<GatewayIntent, GatewayError> {
        if let Some(err) = self.fail_create.lock().unwrap().take() {
            return Err(err);
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let intent = GatewayIntent {
            intent_id: format!("intent_test_{n}"),
            amount,
            currency: currency.to_string(),
        };
        self.created.lock().unwrap().push(intent.clone());
        Ok(intent)
    }

    async fn fetch_status(
        &self,
        gateway_payment_id: &str,
    ) -> Result<GatewayPaymentStatus, GatewayError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(gateway_payment_id)
            .copied()
            .unwrap_or(GatewayPaymentStatus::Captured))
    }

    async fn refund(
        &self,
        gateway_payment_id: &str,
        amount: Option<i64>,
    ) -> Result<String, GatewayError> {
        self.refunds
            .lock()
            .unwrap()
            .push((gateway_payment_id.to_string(), amount));
        Ok(format!("rfnd_test_{gateway_payment_id}"))
    }
}

/// One fully wired server state over a scratch database. The tempdir
/// must stay alive for the duration of the test.
pub struct TestCtx {
    _dir: tempfile::TempDir,
    pub state: ServerState,
    pub gateway: Arc<MockGateway>,
}

impl TestCtx {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("commerce.db");
        let config = Config::for_tests(db_path.to_string_lossy());
        let db = DbService::new(&config.database_path)
            .await
            .expect("open database");
        let gateway = Arc::new(MockGateway::new());
        let state = ServerState::with_gateway(
            config,
            db,
            Arc::clone(&gateway) as Arc<dyn PaymentGateway>,
        );
        Self {
            _dir: dir,
            state,
            gateway,
        }
    }

    /// Callback signature the verifier will accept, computed with the
    /// test config's shared secret.
    pub fn sign(&self, intent_id: &str, gateway_payment_id: &str) -> String {
        SignatureScheme::new(self.state.config.gateway_key_secret.as_bytes())
            .sign(intent_id, gateway_payment_id)
    }

    pub async fn seed_variant(&self, id: &str, unit_price: i64, stock: i64) {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO product_variants \
             (id, sku, product_name, unit_price, stock_quantity, reserved_quantity, is_active, \
              created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, 0, 1, ?6, ?6)",
        )
        .bind(id)
        .bind(format!("SKU-{id}"))
        .bind(format!("Variant {id}"))
        .bind(unit_price)
        .bind(stock)
        .bind(&now)
        .execute(self.state.db.pool())
        .await
        .expect("seed variant");
    }

    pub async fn seed_percentage_coupon(
        &self,
        code: &str,
        percent: f64,
        min_purchase: Option<i64>,
        max_uses: Option<i64>,
    ) {
        self.seed_coupon(code, "percentage", percent, min_purchase, max_uses)
            .await;
    }

    pub async fn seed_fixed_coupon(&self, code: &str, amount_minor: i64) {
        self.seed_coupon(code, "fixed", amount_minor as f64, None, None)
            .await;
    }

    async fn seed_coupon(
        &self,
        code: &str,
        discount_type: &str,
        value: f64,
        min_purchase: Option<i64>,
        max_uses: Option<i64>,
    ) {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO coupons \
             (id, code, discount_type, discount_value, min_purchase_amount, max_uses, \
              current_uses, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 1, ?7)",
        )
        .bind(format!("coupon_{code}"))
        .bind(code)
        .bind(discount_type)
        .bind(value)
        .bind(min_purchase)
        .bind(max_uses)
        .bind(&now)
        .execute(self.state.db.pool())
        .await
        .expect("seed coupon");
    }

    pub async fn add_to_cart(&self, user_id: &str, variant_id: &str, qty: i64) {
        self.state
            .carts()
            .add_item(user_id, variant_id, qty)
            .await
            .expect("add to cart");
    }

    pub async fn stock_of(&self, variant_id: &str) -> (i64, i64) {
        sqlx::query_as::<_, (i64, i64)>(
            "SELECT stock_quantity, reserved_quantity FROM product_variants WHERE id = ?1",
        )
        .bind(variant_id)
        .fetch_one(self.state.db.pool())
        .await
        .expect("variant row")
    }

    pub async fn coupon_uses(&self, code: &str) -> i64 {
        sqlx::query_scalar("SELECT current_uses FROM coupons WHERE code = ?1")
            .bind(code)
            .fetch_one(self.state.db.pool())
            .await
            .expect("coupon row")
    }
}
