//! Checkout payment state machine.
//!
//! ```text
//! idle -> processing -> succeeded
//!              |    ^
//!              v    |
//!             failed
//! ```
//!
//! A failed attempt can be restarted by the visitor. Success is terminal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a payment attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PaymentFailure {
    /// The payment SDK script never loaded in the browser.
    SdkNotLoaded,
    /// The backend refused or failed to create a payment intent.
    IntentCreation(String),
    /// The card was declined or the confirmation failed.
    Confirmation(String),
}

impl PaymentFailure {
    /// Message shown inline on the checkout page.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::SdkNotLoaded => {
                "The payment form could not be loaded. Please reload the page.".to_string()
            }
            Self::IntentCreation(detail) => {
                format!("We could not start the payment: {detail}")
            }
            Self::Confirmation(detail) => format!("Your payment was not completed: {detail}"),
        }
    }
}

/// An attempted transition the machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid payment transition from {from} to {to}")]
pub struct PaymentError {
    pub from: &'static str,
    pub to: &'static str,
}

/// Where a checkout's payment currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PaymentState {
    #[default]
    Idle,
    Processing,
    Succeeded { transaction_id: String },
    Failed { failure: PaymentFailure },
}

impl PaymentState {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }

    /// Begin an attempt. Allowed from idle and after a failure.
    ///
    /// # Errors
    ///
    /// Fails while an attempt is in flight or after success.
    pub fn start(&mut self) -> Result<(), PaymentError> {
        match self {
            Self::Idle | Self::Failed { .. } => {
                *self = Self::Processing;
                Ok(())
            }
            Self::Processing | Self::Succeeded { .. } => Err(self.reject("processing")),
        }
    }

    /// Record a confirmed payment.
    ///
    /// # Errors
    ///
    /// Fails unless an attempt is in flight.
    pub fn succeed(&mut self, transaction_id: impl Into<String>) -> Result<(), PaymentError> {
        if !matches!(self, Self::Processing) {
            return Err(self.reject("succeeded"));
        }
        *self = Self::Succeeded {
            transaction_id: transaction_id.into(),
        };
        Ok(())
    }

    /// Record a failed attempt.
    ///
    /// # Errors
    ///
    /// Fails unless an attempt is in flight.
    pub fn fail(&mut self, failure: PaymentFailure) -> Result<(), PaymentError> {
        if !matches!(self, Self::Processing) {
            return Err(self.reject("failed"));
        }
        *self = Self::Failed { failure };
        Ok(())
    }

    /// The transaction id once the payment succeeded.
    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            Self::Succeeded { transaction_id } => Some(transaction_id),
            _ => None,
        }
    }

    /// The failure of the last attempt, if it failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&PaymentFailure> {
        match self {
            Self::Failed { failure } => Some(failure),
            _ => None,
        }
    }

    const fn reject(&self, to: &'static str) -> PaymentError {
        PaymentError {
            from: self.name(),
            to,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = PaymentState::default();
        state.start().unwrap();
        state.succeed("pi_1").unwrap();
        assert_eq!(state.transaction_id(), Some("pi_1"));
    }

    #[test]
    fn test_failed_attempt_can_restart() {
        let mut state = PaymentState::default();
        state.start().unwrap();
        state
            .fail(PaymentFailure::Confirmation("card declined".into()))
            .unwrap();
        assert!(state.failure().unwrap().message().contains("card declined"));
        state.start().unwrap();
        assert_eq!(state, PaymentState::Processing);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut idle = PaymentState::Idle;
        assert_eq!(
            idle.succeed("pi"),
            Err(PaymentError { from: "idle", to: "succeeded" })
        );
        assert!(idle.fail(PaymentFailure::SdkNotLoaded).is_err());

        let mut processing = PaymentState::Processing;
        assert!(processing.start().is_err());

        let mut done = PaymentState::Succeeded {
            transaction_id: "pi".into(),
        };
        assert!(done.start().is_err());
        assert!(done.fail(PaymentFailure::SdkNotLoaded).is_err());
        assert_eq!(done.transaction_id(), Some("pi"));
    }

    #[test]
    fn test_state_survives_session_serialization() {
        let state = PaymentState::Failed {
            failure: PaymentFailure::IntentCreation("HTTP 502".into()),
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(serde_json::from_str::<PaymentState>(&json).unwrap(), state);
    }
}
