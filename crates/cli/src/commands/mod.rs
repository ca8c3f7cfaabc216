//! Subcommands and the connection setup they share.
//!
//! # Environment Variables
//!
//! - `SAFEUSE_API_URL` - Backend origin (required)
//! - `SAFEUSE_API_TIMEOUT_SECS` - Per-request timeout (default 10)
//! - `SAFEUSE_ADMIN_EMAIL`, `SAFEUSE_ADMIN_PASSWORD` - Admin account for
//!   the admin-only resources

pub mod check;
pub mod dump;

use std::time::Duration;

use safeuse_backend::{BackendClient, BackendConfig, BackendError, Credentials};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Environment variable has an unusable value.
    #[error("Invalid value for {0}: {1}")]
    InvalidEnvVar(&'static str, String),

    /// The backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Writing the dump failed.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),

    /// The resource needs an admin account.
    #[error("{0} needs SAFEUSE_ADMIN_EMAIL and SAFEUSE_ADMIN_PASSWORD")]
    AdminRequired(&'static str),

    /// At least one probe failed.
    #[error("{0} endpoint(s) failed")]
    ChecksFailed(usize),
}

/// Build a backend client from the environment.
///
/// The cache is irrelevant for one-shot commands, so it is kept short.
fn client_from_env() -> Result<BackendClient, CliError> {
    let raw = std::env::var("SAFEUSE_API_URL")
        .map_err(|_| CliError::MissingEnvVar("SAFEUSE_API_URL"))?;
    let base_url =
        Url::parse(&raw).map_err(|e| CliError::InvalidEnvVar("SAFEUSE_API_URL", e.to_string()))?;

    let timeout_secs = match std::env::var("SAFEUSE_API_TIMEOUT_SECS") {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|e| CliError::InvalidEnvVar("SAFEUSE_API_TIMEOUT_SECS", e.to_string()))?,
        Err(_) => 10,
    };

    Ok(BackendClient::new(&BackendConfig {
        base_url,
        timeout: Duration::from_secs(timeout_secs),
        cache_ttl: Duration::from_secs(1),
    })?)
}

/// Sign in with the admin account from the environment, if one is set.
async fn admin_login(client: &BackendClient) -> Result<Option<Credentials>, CliError> {
    let (Ok(email), Ok(password)) = (
        std::env::var("SAFEUSE_ADMIN_EMAIL"),
        std::env::var("SAFEUSE_ADMIN_PASSWORD"),
    ) else {
        return Ok(None);
    };

    let login = client.login(&email, &SecretString::from(password)).await?;
    if !login.user.role.is_admin() {
        tracing::warn!(email = %email, "Account is not an admin; admin resources skipped");
        return Ok(None);
    }
    Ok(Some(login.credentials))
}

/// End the backend session opened by [`admin_login`].
async fn admin_logout(client: &BackendClient, credentials: &Credentials) {
    if let Err(e) = client.logout(credentials).await {
        tracing::debug!(error = %e, "Logout failed");
    }
}
