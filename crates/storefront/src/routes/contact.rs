//! Contact form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use safeuse_core::records::{FieldError, MAX_MESSAGE_LENGTH, NewContactSubmission};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::models::Flash;
use crate::page::{PageContext, set_flash};
use crate::state::AppState;

/// Contact form data, echoed back when validation fails.
#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub page: PageContext,
    pub form: ContactForm,
    pub errors: Vec<FieldError>,
    /// Set when the backend rejected a valid submission.
    pub submit_error: Option<String>,
    pub max_message_length: usize,
}

impl ContactTemplate {
    /// The validation message for `field`, or an empty string.
    #[must_use]
    pub fn error_for(&self, field: &str) -> &str {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map_or("", |e| e.message.as_str())
    }
}

/// Display the empty contact form.
#[instrument(skip(page))]
pub async fn show(page: PageContext) -> impl IntoResponse {
    ContactTemplate {
        page,
        form: ContactForm::default(),
        errors: Vec::new(),
        submit_error: None,
        max_message_length: MAX_MESSAGE_LENGTH,
    }
}

/// Validate and forward a submission.
///
/// Invalid input re-renders the form with per-field messages; nothing is
/// sent to the backend.
#[instrument(skip(state, session, page, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<ContactForm>,
) -> Result<Response> {
    let submission = match NewContactSubmission::validate(
        &form.first_name,
        &form.last_name,
        &form.email,
        Some(form.phone.as_str()),
        &form.message,
    ) {
        Ok(submission) => submission,
        Err(errors) => {
            tracing::debug!(count = errors.len(), "Contact form rejected");
            return Ok(ContactTemplate {
                page,
                form,
                errors,
                submit_error: None,
                max_message_length: MAX_MESSAGE_LENGTH,
            }
            .into_response());
        }
    };

    if let Err(e) = state.backend().submit_contact(&submission).await {
        tracing::error!(error = %e, "Contact submission failed");
        return Ok(ContactTemplate {
            page,
            form,
            errors: Vec::new(),
            submit_error: Some(e.user_message()),
            max_message_length: MAX_MESSAGE_LENGTH,
        }
        .into_response());
    }

    tracing::info!("Contact submission sent");
    set_flash(
        &session,
        Flash::notice("Thanks for your message. We will get back to you soon."),
    )
    .await;
    Ok(Redirect::to("/contact").into_response())
}
