//! Payment intents, order creation and the public contact form.

use reqwest::Method;
use safeuse_core::normalize::{Fields, unwrap_object};
use safeuse_core::records::{NewContactSubmission, NewOrder};
use serde::Serialize;
use tracing::{info, instrument};

use crate::client::BackendClient;
use crate::credentials::Credentials;
use crate::error::BackendError;
use crate::paths;

/// Currency every intent is created in.
pub const CURRENCY: &str = "eur";

/// A payment intent created by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntent {
    /// Secret the browser passes to the payment SDK.
    pub client_secret: String,
    pub id: Option<String>,
}

#[derive(Serialize)]
struct IntentRequest<'a> {
    amount: i64,
    currency: &'a str,
}

impl BackendClient {
    /// Create a payment intent for `amount_cents`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the answer carries no client
    /// secret.
    #[instrument(skip(self, credentials))]
    pub async fn create_payment_intent(
        &self,
        amount_cents: i64,
        credentials: Option<&Credentials>,
    ) -> Result<PaymentIntent, BackendError> {
        let body = self
            .send_json(
                Method::POST,
                paths::PAYMENT_INTENT,
                &IntentRequest {
                    amount: amount_cents,
                    currency: CURRENCY,
                },
                credentials,
            )
            .await?;

        let fields = Fields::of("payment intent", unwrap_object(&body, &["data", "paymentIntent"]))?;
        let client_secret =
            fields.required_text(&["clientSecret", "client_secret", "secret"], "client_secret")?;
        let id = fields.text(&["id", "paymentIntentId", "payment_intent_id"]).or_else(|| {
            // Secrets look like `pi_123_secret_abc`.
            client_secret
                .split_once("_secret_")
                .map(|(id, _)| id.to_string())
        });

        info!(intent_id = ?id, "Payment intent created");
        Ok(PaymentIntent { client_secret, id })
    }

    /// Record a paid order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the order.
    #[instrument(skip(self, order, credentials), fields(payment_intent_id = %order.payment_intent_id))]
    pub async fn create_order(
        &self,
        order: &NewOrder,
        credentials: Option<&Credentials>,
    ) -> Result<(), BackendError> {
        self.send_json_ignoring_body(Method::POST, paths::ORDER_CREATE, order, credentials)
            .await
    }

    /// Send a contact form submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the submission.
    #[instrument(skip(self, submission))]
    pub async fn submit_contact(&self, submission: &NewContactSubmission) -> Result<(), BackendError> {
        self.send_json_ignoring_body(Method::POST, paths::CONTACT, submission, None)
            .await
    }
}
