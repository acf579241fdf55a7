//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL the Mini App is served from
//! - `GATEWAY_URL` - Spreadsheet webhook endpoint (contains the deployment ID)
//! - `PAYMENT_BASE_URL` - Default hosted payment page
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CATALOG_CACHE_PATH` - File holding the last synced catalog (default: none)
//! - `ADMIN_USER_IDS` - Comma-separated Telegram user IDs allowed on `/admin`
//! - `STORE_CURRENCY` - Currency sign shown after prices (default: ₽)
//! - `SESSION_IDLE_SECS` - Idle expiry of per-user state (default: 1800)
//! - `GATEWAY_TIMEOUT_SECS` - Outbound request timeout, 0 = none (default: 0)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the Mini App
    pub base_url: String,
    /// Spreadsheet gateway configuration
    pub gateway: GatewayConfig,
    /// Payment page configuration
    pub payment: PaymentConfig,
    /// Disposable catalog cache file
    pub catalog_cache_path: Option<PathBuf>,
    /// Telegram users allowed to open the admin dashboard
    pub admin_user_ids: Vec<i64>,
    /// Currency sign appended to prices
    pub currency: String,
    /// Idle expiry of per-user state
    pub session_idle: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., production, staging)
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 - 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Spreadsheet gateway configuration.
///
/// Implements `Debug` manually to redact the endpoint.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Webhook endpoint; anyone holding it can write to the spreadsheet
    pub url: SecretString,
    /// Outbound request timeout (`None` = wait forever)
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Hosted payment page configuration.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Payment page used when a product has no link of its own
    pub base_url: Url,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let gateway = GatewayConfig::from_env()?;
        let payment = PaymentConfig::from_env()?;
        let catalog_cache_path = get_optional_env("CATALOG_CACHE_PATH").map(PathBuf::from);
        let admin_user_ids = parse_id_list(
            "ADMIN_USER_IDS",
            &get_optional_env("ADMIN_USER_IDS").unwrap_or_default(),
        )?;
        let currency = get_env_or_default("STORE_CURRENCY", "₽");
        let session_idle = Duration::from_secs(parse_env("SESSION_IDLE_SECS", "1800")?);

        Ok(Self {
            host,
            port,
            base_url,
            gateway,
            payment,
            catalog_cache_path,
            admin_user_ids,
            currency,
            session_idle,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns true if this Telegram user may open the admin dashboard.
    #[must_use]
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_user_ids.contains(&user_id)
    }

    /// Returns true when served over HTTPS (session cookies are `Secure`).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl GatewayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("GATEWAY_URL")?;
        Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("GATEWAY_URL".to_string(), e.to_string()))?;

        let timeout_secs: u64 = parse_env("GATEWAY_TIMEOUT_SECS", "0")?;
        Ok(Self {
            url: SecretString::from(raw),
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        })
    }

    /// Parsed endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored URL does not parse (only possible when
    /// the struct was built by hand).
    pub fn endpoint(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.url.expose_secret())
    }
}

impl PaymentConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = get_required_env("PAYMENT_BASE_URL")?;
        let base_url = Url::parse(&raw).map_err(|e| {
            ConfigError::InvalidEnvVar("PAYMENT_BASE_URL".to_string(), e.to_string())
        })?;
        Ok(Self { base_url })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable (blank counts as unset).
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a comma-separated list of Telegram user IDs.
fn parse_id_list(key: &str, raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), format!("{s}: {e}")))
        })
        .collect()
}
