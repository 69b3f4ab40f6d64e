use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";

/// Application configuration with validation.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Redis connection URL (chat fan-out broker)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Secret used to sign session tokens (minimum 32 characters)
    #[validate(length(min = 32))]
    pub session_secret: String,

    /// Session lifetime in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Session lifetime when the client asks to be remembered
    #[serde(default = "default_session_ttl_remember")]
    pub session_ttl_remember_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB pool: connect timeout in seconds
    #[serde(default = "default_db_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// DB pool: idle timeout in seconds
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,

    /// DB pool: acquire timeout in seconds
    #[serde(default = "default_db_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Capacity of the in-process event channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Delay before the support bot replies, in milliseconds
    #[serde(default = "default_auto_reply_delay_ms")]
    pub auto_reply_delay_ms: u64,

    /// Chat fan-out broker backend: "none", "in-memory", or "redis"
    #[serde(default = "default_chat_broker_backend")]
    pub chat_broker_backend: String,

    /// Namespace prefix for broker channels
    #[serde(default = "default_chat_broker_namespace")]
    pub chat_broker_namespace: String,

    /// Idle websocket eviction timeout in seconds
    #[serde(default = "default_chat_idle_timeout_secs")]
    pub chat_idle_timeout_secs: u64,

    /// Per-socket outbound queue capacity
    #[serde(default = "default_chat_send_queue_capacity")]
    pub chat_send_queue_capacity: usize,

    /// Default page size for product listings
    #[serde(default = "default_api_per_page")]
    pub api_default_per_page: u64,

    /// Maximum page size for product listings
    #[serde(default = "default_api_max_per_page")]
    pub api_max_per_page: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}
fn default_session_ttl() -> u64 {
    86_400
}
fn default_session_ttl_remember() -> u64 {
    2_592_000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
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
fn default_db_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_event_channel_capacity() -> usize {
    1024
}
fn default_auto_reply_delay_ms() -> u64 {
    1000
}
fn default_chat_broker_backend() -> String {
    "none".to_string()
}
fn default_chat_broker_namespace() -> String {
    "eshop:chat".to_string()
}
fn default_chat_idle_timeout_secs() -> u64 {
    300
}
fn default_chat_send_queue_capacity() -> usize {
    64
}
fn default_api_per_page() -> u64 {
    12
}
fn default_api_max_per_page() -> u64 {
    100
}

impl AppConfig {
    /// Creates a configuration programmatically (used by tests and tools).
    pub fn new(
        database_url: String,
        redis_url: String,
        session_secret: String,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            redis_url,
            session_secret,
            session_ttl_secs: default_session_ttl(),
            session_ttl_remember_secs: default_session_ttl_remember(),
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_timeout_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            auto_reply_delay_ms: default_auto_reply_delay_ms(),
            chat_broker_backend: default_chat_broker_backend(),
            chat_broker_namespace: default_chat_broker_namespace(),
            chat_idle_timeout_secs: default_chat_idle_timeout_secs(),
            chat_send_queue_capacity: default_chat_send_queue_capacity(),
            api_default_per_page: default_api_per_page(),
            api_max_per_page: default_api_max_per_page(),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "test"
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration load error: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads application configuration.
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

    // session_secret has no default: it must come from a config file or
    // the environment so an insecure default can never ship.
    let builder = Config::builder()
        .set_default("database_url", "sqlite://eshop.db?mode=rwc")?
        .set_default("redis_url", "redis://localhost:6379")?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("session_secret").is_err() {
        error!("Session secret is not configured. Set APP__SESSION_SECRET with a secure random string (minimum 32 characters).");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "session_secret is required but not configured. Set APP__SESSION_SECRET environment variable.".into(),
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

/// Initializes tracing using the provided log level as the default filter.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("eshop_api={},tower_http=debug", level);
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

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite://test.db?mode=rwc".to_string(),
            "redis://127.0.0.1:6379".to_string(),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        )
    }

    #[test]
    fn defaults_are_sane() {
        let cfg = base_config();
        assert_eq!(cfg.api_default_per_page, 12);
        assert_eq!(cfg.chat_broker_backend, "none");
        assert!(cfg.session_ttl_remember_secs > cfg.session_ttl_secs);
    }

    #[test]
    fn development_allows_permissive_cors() {
        let mut cfg = base_config();
        cfg.environment = "development".to_string();
        assert!(cfg.should_allow_permissive_cors());

        cfg.environment = "production".to_string();
        assert!(!cfg.should_allow_permissive_cors());

        cfg.cors_allow_any_origin = true;
        assert!(cfg.should_allow_permissive_cors());
    }

    #[test]
    fn short_session_secret_fails_validation() {
        let mut cfg = base_config();
        cfg.session_secret = "short".to_string();
        assert!(cfg.validate().is_err());
    }
}
