//! Server configuration
//!
//! All settings can be overridden through environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | DATABASE_PATH | ./data/commerce.db | SQLite database file |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | ENVIRONMENT | development | development \| staging \| production |
//! | CURRENCY | INR | settlement currency for payment intents |
//! | PAYMENT_GATEWAY_URL | https://api.razorpay.com | gateway base URL |
//! | PAYMENT_KEY_ID | (empty) | gateway API key id |
//! | PAYMENT_KEY_SECRET | (empty) | gateway shared secret (also signs callbacks) |
//! | PAYMENT_TIMEOUT_MS | 10000 | gateway request deadline |
//! | REQUEST_TIMEOUT_MS | 30000 | inbound request timeout |
//! | LOG_DIR | (unset) | rolling log file directory |

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path
    pub database_path: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Currency code used for all payment intents
    pub currency: String,

    // === Payment gateway ===
    /// Gateway base URL
    pub gateway_url: String,
    /// Gateway API key id
    pub gateway_key_id: String,
    /// Shared secret: authenticates gateway calls and callback signatures
    pub gateway_key_secret: String,
    /// Deadline for outbound gateway calls (milliseconds)
    pub gateway_timeout_ms: u64,

    /// Inbound request timeout (milliseconds)
    pub request_timeout_ms: u64,
    /// Optional log directory for daily-rolling files
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./data/commerce.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "INR".into()),
            gateway_url: std::env::var("PAYMENT_GATEWAY_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".into()),
            gateway_key_id: std::env::var("PAYMENT_KEY_ID").unwrap_or_default(),
            gateway_key_secret: std::env::var("PAYMENT_KEY_SECRET").unwrap_or_default(),
            gateway_timeout_ms: std::env::var("PAYMENT_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10_000),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30_000),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }

    /// Configuration for tests: scratch database, fixed secret
    pub fn for_tests(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            http_port: 0,
            environment: "test".into(),
            currency: "INR".into(),
            gateway_url: "http://localhost:0".into(),
            gateway_key_id: "test_key".into(),
            gateway_key_secret: "test_secret".into(),
            gateway_timeout_ms: 1_000,
            request_timeout_ms: 5_000,
            log_dir: None,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
