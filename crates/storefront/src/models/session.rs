//! Session-stored state.
//!
//! The cart, payment state and sign-in live under the keys in [`keys`]. The
//! signed-in user and their credentials are typed by the backend crate.

use serde::{Deserialize, Serialize};

/// Session keys for storefront state.
pub mod keys {
    /// Signed-in user (`SessionUser`).
    pub const CURRENT_USER: &str = "current_user";

    /// Backend credentials forwarded on behalf of the visitor.
    pub const CREDENTIALS: &str = "backend_credentials";

    /// The visitor's cart.
    pub const CART: &str = "cart";

    /// Payment state machine for the current checkout.
    pub const PAYMENT: &str = "payment_state";

    /// Id of the payment intent created for the current attempt.
    pub const PAYMENT_INTENT: &str = "payment_intent_id";

    /// Cardholder and shipping details entered on the checkout page.
    pub const CHECKOUT_DETAILS: &str = "checkout_details";

    /// One-shot message shown on the next rendered page.
    pub const FLASH: &str = "flash";
}

/// What the visitor typed on the checkout page before paying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    pub cardholder_name: String,
    pub shipping_address: String,
}

/// A message carried across a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub message: String,
    /// Errors render with `role="alert"`, notices with `role="status"`.
    pub is_error: bool,
}

impl Flash {
    #[must_use]
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }

    #[must_use]
    pub const fn role(&self) -> &'static str {
        if self.is_error { "alert" } else { "status" }
    }
}
