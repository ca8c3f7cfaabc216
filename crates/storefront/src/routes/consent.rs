//! Cookie banner answers.

use axum::{Form, response::Redirect};
use safeuse_core::preferences::{COOKIE_CONSENT, CookieConsent};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::CookiePreferences;
use crate::routes::local_path;

/// Cookie banner form data.
#[derive(Debug, Deserialize)]
pub struct ConsentForm {
    /// `accept` or `reject`.
    pub choice: String,
    /// Page to go back to.
    #[serde(default)]
    pub return_to: String,
}

/// Store the visitor's choice for a year and go back to the page they were on.
#[instrument(skip(preferences))]
pub async fn update(
    preferences: CookiePreferences,
    Form(form): Form<ConsentForm>,
) -> Result<Redirect> {
    let consent = match form.choice.as_str() {
        "accept" => CookieConsent::Accepted,
        "reject" => CookieConsent::Rejected,
        other => return Err(AppError::BadRequest(format!("Unknown consent choice: {other}"))),
    };

    preferences.set(&COOKIE_CONSENT, &consent);
    Ok(Redirect::to(local_path(&form.return_to)))
}
