//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `SAFEUSE_API_URL` - Origin of the SafeUse backend API
//! - `STRIPE_PUBLISHABLE_KEY` - Publishable key for the hosted payment element
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SAFEUSE_API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `SAFEUSE_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use safeuse_backend::BackendConfig;
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
    /// Public base URL for the storefront
    pub base_url: String,
    /// SafeUse backend API settings
    pub api: BackendConfig,
    /// Stripe publishable key (`pk_...`), safe to embed in pages
    pub stripe_publishable_key: String,
    /// Directory served under `/static`
    pub static_dir: String,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any value is
    /// malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let api = backend_config_from_env(300)?;

        let stripe_publishable_key = get_required_env("STRIPE_PUBLISHABLE_KEY")?;
        validate_publishable_key(&stripe_publishable_key)?;

        Ok(Self {
            host,
            port,
            base_url,
            api,
            stripe_publishable_key,
            static_dir: get_env_or_default("STOREFRONT_STATIC_DIR", "crates/storefront/static"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Get the socket address to bind to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Backend settings shared with the other binaries' variable names.
fn backend_config_from_env(default_ttl_secs: u64) -> Result<BackendConfig, ConfigError> {
    let raw_url = get_required_env("SAFEUSE_API_URL")?;
    let base_url = Url::parse(&raw_url)
        .map_err(|e| ConfigError::InvalidEnvVar("SAFEUSE_API_URL".to_string(), e.to_string()))?;
    let timeout: u64 = parse_env("SAFEUSE_API_TIMEOUT_SECS", "10")?;
    let cache_ttl: u64 = parse_env("SAFEUSE_CACHE_TTL_SECS", &default_ttl_secs.to_string())?;

    Ok(BackendConfig {
        base_url,
        timeout: Duration::from_secs(timeout),
        cache_ttl: Duration::from_secs(cache_ttl),
    })
}

fn validate_publishable_key(key: &str) -> Result<(), ConfigError> {
    if key.starts_with("pk_") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            "STRIPE_PUBLISHABLE_KEY".to_string(),
            "must be a publishable key starting with pk_ (never a secret key)".to_string(),
        ))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_publishable_key_prefix() {
        assert!(validate_publishable_key("pk_test_123").is_ok());
        let err = validate_publishable_key("sk_live_123").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref name, _) if name == "STRIPE_PUBLISHABLE_KEY"));
    }

    #[test]
    fn test_parse_env_default() {
        let port: u16 = parse_env("SAFEUSE_TEST_UNSET_PORT_VAR", "3000").unwrap();
        assert_eq!(port, 3000);
        assert!(parse_env::<u16>("SAFEUSE_TEST_UNSET_PORT_VAR", "nope").is_err());
    }

    #[test]
    fn test_missing_required() {
        let err = get_required_env("SAFEUSE_TEST_DEFINITELY_UNSET").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variable: SAFEUSE_TEST_DEFINITELY_UNSET"
        );
    }
}
