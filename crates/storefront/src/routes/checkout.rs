//! Checkout and payment.
//!
//! Card details never reach this server. The page collects the cardholder
//! name and shipping address, asks [`create_intent`] for a client secret, and
//! confirms the payment in the browser with the hosted payment element. The
//! outcome comes back through [`report_result`], which drives the session's
//! [`PaymentState`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use safeuse_backend::SessionUser;
use safeuse_core::payment::{PaymentFailure, PaymentState};
use safeuse_core::records::NewOrder;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::VisitorCredentials;
use crate::models::{CheckoutDetails, session_keys};
use crate::page::PageContext;
use crate::routes::cart::{CartView, TotalsView, load_cart, save_cart};
use crate::state::AppState;

/// Longest accepted cardholder name or address.
const MAX_DETAIL_LENGTH: usize = 500;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/index.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub cart: CartView,
    pub details: CheckoutDetails,
    pub publishable_key: String,
    /// Message for the failed previous attempt, if any.
    pub error: Option<String>,
    /// Shown by the page script when the payment SDK fails to load.
    pub sdk_error: String,
}

/// Confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub page: PageContext,
    pub transaction_id: String,
    pub totals: TotalsView,
}

/// Body of `POST /checkout/intent`.
#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    pub cardholder_name: String,
    pub shipping_address: String,
}

/// Answer to `POST /checkout/intent`.
#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub client_secret: String,
}

/// Body of `POST /checkout/result`, reported by the page after confirmation.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentResult {
    Succeeded { transaction_id: String },
    Failed { message: String },
}

/// Answer to `POST /checkout/result`.
#[derive(Debug, Serialize)]
pub struct ResultResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON error for the checkout endpoints.
fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ResultResponse {
            redirect: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}

async fn load_payment(session: &Session) -> Result<PaymentState> {
    Ok(session
        .get::<PaymentState>(session_keys::PAYMENT)
        .await?
        .unwrap_or_default())
}

async fn save_payment(session: &Session, payment: &PaymentState) -> Result<()> {
    session.insert(session_keys::PAYMENT, payment).await?;
    Ok(())
}

/// Trim and bound a free-text checkout field.
fn clean_detail(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty() && value.chars().count() <= MAX_DETAIL_LENGTH).then(|| value.to_string())
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the payment page. An empty cart goes back to the cart page.
#[instrument(skip(state, session, page))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
) -> Result<Response> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let mut payment = load_payment(&session).await?;
    if matches!(payment, PaymentState::Processing | PaymentState::Succeeded { .. }) {
        // Reloading the page abandons the attempt in flight; a fresh checkout
        // starts from idle.
        payment = PaymentState::default();
        save_payment(&session, &payment).await?;
    }

    let details = session
        .get::<CheckoutDetails>(session_keys::CHECKOUT_DETAILS)
        .await?
        .unwrap_or_default();

    Ok(CheckoutTemplate {
        page,
        cart: CartView::new(&cart, state.backend()),
        details,
        publishable_key: state.config().stripe_publishable_key.clone(),
        error: payment.failure().map(PaymentFailure::message),
        sdk_error: PaymentFailure::SdkNotLoaded.message(),
    }
    .into_response())
}

/// Start a payment attempt and create an intent for the cart total.
#[instrument(skip(state, session, credentials, request))]
pub async fn create_intent(
    State(state): State<AppState>,
    session: Session,
    credentials: VisitorCredentials,
    Json(request): Json<IntentRequest>,
) -> Result<Response> {
    let (Some(cardholder_name), Some(shipping_address)) = (
        clean_detail(&request.cardholder_name),
        clean_detail(&request.shipping_address),
    ) else {
        return Ok(json_error(
            StatusCode::BAD_REQUEST,
            "Please enter the cardholder name and shipping address.",
        ));
    };

    let cart = load_cart(&session).await?;
    let amount_cents = cart.totals().total.to_cents().unwrap_or(0);
    if cart.is_empty() || amount_cents <= 0 {
        return Ok(json_error(StatusCode::BAD_REQUEST, "Your cart is empty."));
    }

    let mut payment = load_payment(&session).await?;
    if let Err(e) = payment.start() {
        tracing::warn!(error = %e, "Rejected payment start");
        return Ok(json_error(
            StatusCode::CONFLICT,
            "A payment is already in progress for this checkout.",
        ));
    }

    session
        .insert(
            session_keys::CHECKOUT_DETAILS,
            CheckoutDetails {
                cardholder_name,
                shipping_address,
            },
        )
        .await?;

    match state
        .backend()
        .create_payment_intent(amount_cents, credentials.as_ref())
        .await
    {
        Ok(intent) => {
            save_payment(&session, &payment).await?;
            session
                .insert(session_keys::PAYMENT_INTENT, &intent.id)
                .await?;
            add_breadcrumb("checkout", "Payment intent created", None);
            Ok(Json(IntentResponse {
                client_secret: intent.client_secret,
            })
            .into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, amount_cents, "Payment intent creation failed");
            let failure = PaymentFailure::IntentCreation(e.user_message());
            let message = failure.message();
            payment
                .fail(failure)
                .map_err(|e| AppError::Internal(e.to_string()))?;
            save_payment(&session, &payment).await?;
            Ok(json_error(StatusCode::BAD_GATEWAY, message))
        }
    }
}

/// Record the outcome of the in-browser confirmation.
#[instrument(skip(session))]
pub async fn report_result(
    session: Session,
    Json(result): Json<PaymentResult>,
) -> Result<Response> {
    let mut payment = load_payment(&session).await?;

    match result {
        PaymentResult::Succeeded { transaction_id } => {
            let expected = session
                .get::<Option<String>>(session_keys::PAYMENT_INTENT)
                .await?
                .flatten();
            if !matches_intent(expected.as_deref(), &transaction_id) {
                tracing::warn!(%transaction_id, ?expected, "Reported transaction does not match intent");
                return Ok(json_error(
                    StatusCode::BAD_REQUEST,
                    "The payment does not match this checkout.",
                ));
            }

            if let Err(e) = payment.succeed(transaction_id) {
                tracing::warn!(error = %e, "Rejected payment success");
                return Ok(json_error(StatusCode::CONFLICT, "No payment is in progress."));
            }
            save_payment(&session, &payment).await?;
            Ok(Json(ResultResponse {
                redirect: Some("/checkout/confirmation".to_string()),
                error: None,
            })
            .into_response())
        }
        PaymentResult::Failed { message } => {
            let failure = PaymentFailure::Confirmation(message);
            let shown = failure.message();
            if let Err(e) = payment.fail(failure) {
                tracing::warn!(error = %e, "Rejected payment failure");
                return Ok(json_error(StatusCode::CONFLICT, "No payment is in progress."));
            }
            save_payment(&session, &payment).await?;
            tracing::info!("Payment confirmation failed");
            Ok(json_error(StatusCode::OK, shown))
        }
    }
}

/// A success report only counts against a recorded intent id.
fn matches_intent(expected: Option<&str>, transaction_id: &str) -> bool {
    expected.is_some_and(|id| id == transaction_id)
}

/// Show the transaction id, record the order and empty the cart.
///
/// Order creation is best effort: the payment has already gone through, so a
/// failure is logged rather than shown.
#[instrument(skip(state, session, credentials, page))]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
    credentials: VisitorCredentials,
    page: PageContext,
) -> Result<Response> {
    let payment = load_payment(&session).await?;
    let Some(transaction_id) = payment.transaction_id().map(String::from) else {
        return Ok(Redirect::to("/cart").into_response());
    };

    let mut cart = load_cart(&session).await?;
    let details = session
        .get::<CheckoutDetails>(session_keys::CHECKOUT_DETAILS)
        .await?
        .unwrap_or_default();
    let user_id = session
        .get::<SessionUser>(session_keys::CURRENT_USER)
        .await?
        .map(|user| user.id)
        .filter(|id| !id.is_missing());

    let order = NewOrder::from_cart(
        &cart,
        user_id,
        transaction_id.clone(),
        details.shipping_address,
    );
    if let Err(e) = state
        .backend()
        .create_order(&order, credentials.as_ref())
        .await
    {
        tracing::error!(error = %e, %transaction_id, "Order creation failed after payment");
    } else {
        tracing::info!(%transaction_id, "Order recorded");
    }

    let totals = TotalsView::from(cart.totals());
    cart.clear();
    save_cart(&session, &cart).await?;
    session.remove::<PaymentState>(session_keys::PAYMENT).await?;
    session
        .remove::<CheckoutDetails>(session_keys::CHECKOUT_DETAILS)
        .await?;
    session
        .remove::<Option<String>>(session_keys::PAYMENT_INTENT)
        .await?;

    Ok(ConfirmationTemplate {
        page,
        transaction_id,
        totals,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_detail() {
        assert_eq!(clean_detail("  Ana Ruiz "), Some("Ana Ruiz".to_string()));
        assert_eq!(clean_detail("   "), None);
        assert_eq!(clean_detail(&"x".repeat(MAX_DETAIL_LENGTH + 1)), None);
    }

    #[test]
    fn test_matches_intent() {
        assert!(matches_intent(Some("pi_1"), "pi_1"));
        assert!(!matches_intent(Some("pi_1"), "pi_2"));
        assert!(!matches_intent(None, "pi_1"));
    }

    #[test]
    fn test_payment_result_parsing() {
        let ok: PaymentResult =
            serde_json::from_str(r#"{"status":"succeeded","transaction_id":"pi_1"}"#).unwrap();
        assert!(matches!(ok, PaymentResult::Succeeded { ref transaction_id } if transaction_id == "pi_1"));

        let failed: PaymentResult =
            serde_json::from_str(r#"{"status":"failed","message":"Your card was declined."}"#)
                .unwrap();
        assert!(matches!(failed, PaymentResult::Failed { .. }));
    }
}
