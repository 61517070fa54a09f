use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 15;

/// Payment gateway configuration (checkout initialize + verification endpoints)
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Gateway REST base URL
    #[serde(default = "default_gateway_base_url")]
    #[validate(url(message = "gateway base_url must be a valid URL"))]
    pub base_url: String,

    /// Merchant API key (sent in the authorization header)
    #[validate(length(min = 1, message = "Gateway API key is required"))]
    pub api_key: String,

    /// Merchant secret used for HMAC request signing
    #[validate(length(min = 16, message = "Gateway secret must be at least 16 characters"))]
    pub secret_key: String,

    /// URL the gateway redirects the shopper back to after payment
    #[serde(default = "default_callback_url")]
    pub callback_url: String,

    /// Bound on every gateway HTTP call (seconds)
    #[serde(default = "default_gateway_timeout_secs")]
    pub timeout_secs: u64,
}

/// Shipping cost policy applied by the order builder
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ShippingConfig {
    /// Subtotal at or above which shipping is free
    #[serde(default = "default_free_shipping_threshold")]
    pub free_threshold: Decimal,

    /// Flat fee charged below the threshold
    #[serde(default = "default_shipping_flat_fee")]
    pub flat_fee: Decimal,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            free_threshold: default_free_shipping_threshold(),
            flat_fee: default_shipping_flat_fee(),
        }
    }
}

/// Transactional mail provider settings (best-effort notifications)
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    /// Enable outbound mail; when false the in-process dispatcher only logs
    #[serde(default)]
    pub enabled: bool,

    /// Mail provider HTTP API endpoint
    #[serde(default)]
    pub api_url: Option<String>,

    /// Mail provider API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sender address for order mails
    #[serde(default = "default_mail_from")]
    pub from_address: String,
}

/// Account service that owns customer profiles and saved addresses
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AccountsConfig {
    /// Account service REST base URL
    #[serde(default = "default_accounts_base_url")]
    #[validate(url(message = "accounts base_url must be a valid URL"))]
    pub base_url: String,

    /// Service-to-service API key
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            base_url: default_accounts_base_url(),
            api_key: None,
        }
    }
}

/// Browser-facing pages the payment callback redirects to
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PagesConfig {
    /// Order confirmation page (receives orderId + paymentId)
    #[serde(default = "default_success_page")]
    #[validate(url(message = "payment_success_url must be a valid URL"))]
    pub payment_success_url: String,

    /// Payment error page (receives error + message)
    #[serde(default = "default_failure_page")]
    #[validate(url(message = "payment_failure_url must be a valid URL"))]
    pub payment_failure_url: String,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            payment_success_url: default_success_page(),
            payment_failure_url: default_failure_page(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Event channel capacity for async notification dispatch
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Payment gateway credentials and endpoints
    #[validate]
    pub gateway: GatewayConfig,

    /// Shipping cost policy
    #[serde(default)]
    #[validate]
    pub shipping: ShippingConfig,

    /// Mail provider settings
    #[serde(default)]
    #[validate]
    pub mail: MailConfig,

    /// Account service settings
    #[serde(default)]
    #[validate]
    pub accounts: AccountsConfig,

    /// Redirect pages for the payment callback
    #[serde(default)]
    #[validate]
    pub pages: PagesConfig,

    /// Carrier domains accepted for tracking URLs, comma-separated
    #[serde(default = "default_tracking_carrier_domains")]
    pub tracking_carrier_domains: String,
}

impl AppConfig {
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Carrier allow-list as a normalized lowercase vector.
    pub fn carrier_domains(&self) -> Vec<String> {
        self.tracking_carrier_domains
            .split(',')
            .map(|d| d.trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect()
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}
fn default_gateway_base_url() -> String {
    "https://sandbox-api.gateway.example.com".to_string()
}
fn default_callback_url() -> String {
    "http://localhost:8080/api/v1/payments/callback".to_string()
}
fn default_gateway_timeout_secs() -> u64 {
    DEFAULT_GATEWAY_TIMEOUT_SECS
}
fn default_free_shipping_threshold() -> Decimal {
    Decimal::new(500_00, 2)
}
fn default_shipping_flat_fee() -> Decimal {
    Decimal::new(49_90, 2)
}
fn default_accounts_base_url() -> String {
    "http://localhost:8081/api/v1".to_string()
}
fn default_mail_from() -> String {
    "orders@storefront.example.com".to_string()
}
fn default_success_page() -> String {
    "http://localhost:3000/order-confirmation".to_string()
}
fn default_failure_page() -> String {
    "http://localhost:3000/payment-error".to_string()
}
fn default_tracking_carrier_domains() -> String {
    "yurticikargo.com,araskargo.com.tr,mngkargo.com.tr,suratkargo.com.tr,ups.com,dhl.com"
        .to_string()
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("storefront_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // NOTE: gateway.api_key and gateway.secret_key have no defaults - they MUST
    // be provided via environment variable or config file so a deployment can
    // never silently run against placeholder merchant credentials.
    let builder = Config::builder()
        .set_default("database_url", "sqlite://storefront.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("gateway.api_key").is_err() {
        error!("Payment gateway credentials are not configured. Set APP__GATEWAY__API_KEY and APP__GATEWAY__SECRET_KEY.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "gateway.api_key is required but not configured".into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            host: "127.0.0.1".into(),
            port: 8080,
            environment: "development".into(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            gateway: GatewayConfig {
                base_url: default_gateway_base_url(),
                api_key: "sandbox-api-key".into(),
                secret_key: "sandbox-secret-key-0123456789".into(),
                callback_url: default_callback_url(),
                timeout_secs: default_gateway_timeout_secs(),
            },
            shipping: ShippingConfig::default(),
            mail: MailConfig::default(),
            accounts: AccountsConfig::default(),
            pages: PagesConfig::default(),
            tracking_carrier_domains: default_tracking_carrier_domains(),
        }
    }

    #[test]
    fn default_shipping_policy_matches_storefront_rules() {
        let cfg = base_config();
        assert_eq!(cfg.shipping.free_threshold, dec!(500.00));
        assert_eq!(cfg.shipping.flat_fee, dec!(49.90));
    }

    #[test]
    fn carrier_domains_are_normalized() {
        let mut cfg = base_config();
        cfg.tracking_carrier_domains = " UPS.com , dhl.com ,, yurticikargo.com ".into();
        assert_eq!(
            cfg.carrier_domains(),
            vec!["ups.com", "dhl.com", "yurticikargo.com"]
        );
    }

    #[test]
    fn short_gateway_secret_fails_validation() {
        let mut cfg = base_config();
        cfg.gateway.secret_key = "short".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn invalid_log_level_fails_validation() {
        let mut cfg = base_config();
        cfg.log_level = "verbose".into();
        assert!(cfg.validate().is_err());
    }
}
