//! Server state
//!
//! `ServerState` holds the shared handles every request needs: config,
//! the database service, the payment gateway adapter, the callback
//! signature scheme, the audit recorder and the order-number generator.
//! Everything is behind `Arc` (or pool-backed), so cloning the state is
//! cheap and handlers build the domain components they need per call.

use std::sync::Arc;
use std::time::Duration;

use crate::audit::AuditRecorder;
use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::{
    CartRepository, CatalogRepository, CouponRepository, OrderRepository, PaymentRepository,
};
use crate::inventory::InventoryManager;
use crate::orders::{CheckoutOrchestrator, OrderNumberGenerator, OrderStateMachine};
use crate::payments::{HttpPaymentGateway, PaymentGateway, PaymentVerifier, SignatureScheme};
use crate::pricing::PricingEngine;
use crate::utils::AppResult;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub audit: AuditRecorder,
    gateway: Arc<dyn PaymentGateway>,
    signature: SignatureScheme,
    order_numbers: Arc<OrderNumberGenerator>,
}

impl ServerState {
    /// Open the database and wire up the default (HTTP) gateway.
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let db = DbService::new(&config.database_path).await?;
        let gateway = Arc::new(HttpPaymentGateway::new(
            config.gateway_url.clone(),
            config.gateway_key_id.clone(),
            config.gateway_key_secret.clone(),
            Duration::from_millis(config.gateway_timeout_ms),
        )?);
        Ok(Self::with_gateway(config.clone(), db, gateway))
    }

    /// Build state around an explicit gateway implementation (tests
    /// inject a mock here).
    pub fn with_gateway(config: Config, db: DbService, gateway: Arc<dyn PaymentGateway>) -> Self {
        let audit = AuditRecorder::new(db.pool.clone());
        let signature = SignatureScheme::new(config.gateway_key_secret.as_bytes());
        Self {
            config,
            db,
            audit,
            gateway,
            signature,
            order_numbers: Arc::new(OrderNumberGenerator::new()),
        }
    }

    // ==================== Component builders ====================

    pub fn carts(&self) -> CartRepository {
        CartRepository::new(self.db.pool.clone())
    }

    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.db.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.db.pool.clone())
    }

    pub fn coupons(&self) -> CouponRepository {
        CouponRepository::new(self.db.pool.clone())
    }

    pub fn payments(&self) -> PaymentRepository {
        PaymentRepository::new(self.db.pool.clone())
    }

    pub fn inventory(&self) -> InventoryManager {
        InventoryManager::new(self.db.pool.clone(), self.audit.clone())
    }

    pub fn pricing(&self) -> PricingEngine {
        PricingEngine::default()
    }

    pub fn state_machine(&self) -> OrderStateMachine {
        OrderStateMachine::new(self.db.pool.clone(), self.audit.clone())
    }

    pub fn checkout_orchestrator(&self) -> CheckoutOrchestrator {
        CheckoutOrchestrator::new(
            self.carts(),
            self.coupons(),
            self.orders(),
            self.inventory(),
            self.pricing(),
            self.state_machine(),
            Arc::clone(&self.order_numbers),
            self.audit.clone(),
        )
    }

    pub fn payment_verifier(&self) -> PaymentVerifier {
        PaymentVerifier::new(
            self.orders(),
            self.payments(),
            self.inventory(),
            self.state_machine(),
            Arc::clone(&self.gateway),
            self.signature.clone(),
            self.audit.clone(),
            self.config.currency.clone(),
        )
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
