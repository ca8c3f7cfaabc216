//! Errors returned by [`BackendClient`](crate::BackendClient).

use safeuse_core::normalize::NormalizeError;
use thiserror::Error;

/// Errors that can occur when talking to the SafeUse backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not JSON.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response JSON did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Normalize(#[from] NormalizeError),

    /// The requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl BackendError {
    /// HTTP status the backend answered with, if it answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the forwarded credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Short message safe to show to visitors and staff.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(e) if e.is_timeout() => {
                "The SafeUse service took too long to respond.".to_string()
            }
            Self::Http(_) => "The SafeUse service could not be reached.".to_string(),
            Self::Api { status, .. } => {
                format!("The SafeUse service returned an error (HTTP {status}).")
            }
            Self::Parse(_) | Self::Normalize(_) => {
                "The SafeUse service sent a response we could not read.".to_string()
            }
            Self::NotFound(what) => format!("{what} was not found."),
            Self::Url(_) => "The request could not be built.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = BackendError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 502 - bad gateway");
        assert_eq!(err.status(), Some(502));
        assert_eq!(
            err.user_message(),
            "The SafeUse service returned an error (HTTP 502)."
        );
    }

    #[test]
    fn test_unauthorized() {
        let err = BackendError::Api {
            status: 401,
            message: String::new(),
        };
        assert!(err.is_unauthorized());
        assert!(!BackendError::NotFound("Product 3".into()).is_unauthorized());
    }

    #[test]
    fn test_not_found_message() {
        let err = BackendError::NotFound("Substance 9".into());
        assert_eq!(err.user_message(), "Substance 9 was not found.");
    }
}
