//! Checkout page configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MERCADO_PAGO_ACCESS_TOKEN` - Mercado Pago private access token
//!
//! ## Optional
//! - `CHECKOUT_HOST` - Bind address (default: 127.0.0.1)
//! - `CHECKOUT_PORT` - Listen port (default: 3000)
//! - `CHECKOUT_BASE_URL` - Public URL of the page (default: <http://localhost:3000>)
//! - `CHECKOUT_ITEM_TITLE` - Product shown in the summary (default: Checkout Demo)
//! - `CHECKOUT_ITEM_PRICE` - Unit price in BRL (default: 0.00)
//! - `CHECKOUT_STATEMENT_DESCRIPTOR` - Text on the customer's card statement
//! - `CHECKOUT_VISIT_IDLE_MINUTES` - Minutes before an idle draft is dropped (default: 30)
//! - `CHECKOUT_TRUST_PROXY` - Key rate limits on proxy client-IP headers (default: false)
//! - `MERCADO_PAGO_API_URL` - API base URL (default: <https://api.mercadopago.com>)
//! - `MERCADO_PAGO_SANDBOX` - Redirect to the sandbox checkout (default: false)
//! - `MERCADO_PAGO_TIMEOUT_SECS` - Request timeout (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use mp_checkout_core::Price;
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Checkout page configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the page
    pub base_url: String,
    /// What is being sold
    pub item: ItemConfig,
    /// How long an untouched draft is kept
    pub visit_idle_timeout: Duration,
    /// Whether a reverse proxy sets the client-IP headers. Leave off when
    /// clients reach the server directly, since they can forge them.
    pub trust_proxy: bool,
    /// Mercado Pago API configuration
    pub mercado_pago: MercadoPagoConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// The single item shown in the order summary and sent to the provider.
#[derive(Debug, Clone)]
pub struct ItemConfig {
    pub title: String,
    pub price: Price,
    /// Up to 22 characters shown on the customer's card statement.
    pub statement_descriptor: Option<String>,
}

/// Mercado Pago API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct MercadoPagoConfig {
    /// API base URL without trailing slash
    pub api_url: String,
    /// Private access token (server-side only)
    pub access_token: SecretString,
    /// Send customers to the sandbox checkout instead of production
    pub sandbox: bool,
    /// Timeout for the checkout-creation request
    pub timeout: Duration,
}

impl std::fmt::Debug for MercadoPagoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MercadoPagoConfig")
            .field("api_url", &self.api_url)
            .field("access_token", &"[REDACTED]")
            .field("sandbox", &self.sandbox)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the access token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("CHECKOUT_HOST", "127.0.0.1")?;
        let port = parse_env("CHECKOUT_PORT", "3000")?;
        let base_url = get_env_or_default("CHECKOUT_BASE_URL", "http://localhost:3000");
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CHECKOUT_BASE_URL".to_string(), e.to_string())
        })?;
        let visit_idle_timeout =
            idle_timeout(parse_env("CHECKOUT_VISIT_IDLE_MINUTES", "30")?)?;

        Ok(Self {
            host,
            port,
            base_url,
            item: ItemConfig::from_env()?,
            visit_idle_timeout,
            trust_proxy: parse_env("CHECKOUT_TRUST_PROXY", "false")?,
            mercado_pago: MercadoPagoConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Convert the configured idle minutes, rejecting values that overflow.
fn idle_timeout(minutes: u64) -> Result<Duration, ConfigError> {
    minutes
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "CHECKOUT_VISIT_IDLE_MINUTES".to_string(),
                format!("{minutes} minutes is too long"),
            )
        })
}

impl ItemConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let amount: Decimal = parse_env("CHECKOUT_ITEM_PRICE", "0.00")?;
        if amount.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKOUT_ITEM_PRICE".to_string(),
                "must not be negative".to_string(),
            ));
        }

        Ok(Self {
            title: get_env_or_default("CHECKOUT_ITEM_TITLE", "Checkout Demo"),
            price: Price::brl(amount),
            statement_descriptor: get_optional_env("CHECKOUT_STATEMENT_DESCRIPTOR"),
        })
    }
}

impl MercadoPagoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = parse_env("MERCADO_PAGO_TIMEOUT_SECS", "15")?;

        Ok(Self {
            api_url: get_env_or_default("MERCADO_PAGO_API_URL", "https://api.mercadopago.com")
                .trim_end_matches('/')
                .to_string(),
            access_token: get_validated_secret("MERCADO_PAGO_ACCESS_TOKEN")?,
            sandbox: parse_env("MERCADO_PAGO_SANDBOX", "false")?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
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

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real access tokens are long random strings
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= \
                 {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued by Mercado Pago."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
