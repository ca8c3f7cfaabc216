//! Sign-in and sign-out against the SafeUse backend.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{VisitorCredentials, clear_signed_in, set_signed_in};
use crate::models::Flash;
use crate::page::{PageContext, set_flash};
use crate::routes::local_path;
use crate::state::AppState;

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: String,
}

/// Where to go after signing in.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub email: String,
    pub next: String,
    pub error: Option<String>,
}

/// Display the login form.
#[instrument(skip(page))]
pub async fn login_page(Query(query): Query<NextQuery>, page: PageContext) -> impl IntoResponse {
    LoginTemplate {
        page,
        email: String::new(),
        next: local_path(&query.next).to_string(),
        error: None,
    }
}

/// Sign in and keep the backend session in ours.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_string();
    let next = local_path(&form.next).to_string();
    let password = SecretString::from(form.password);

    match state.backend().login(&email, &password).await {
        Ok(login) => {
            set_signed_in(&session, &login).await?;
            set_sentry_user(&login.user.id, Some(&login.user.email));
            set_flash(&session, Flash::notice(format!("Welcome, {}.", login.user.name))).await;
            Ok(Redirect::to(&next).into_response())
        }
        Err(e) => {
            let error = if e.is_unauthorized() {
                "Incorrect email or password.".to_string()
            } else {
                tracing::error!(error = %e, "Login request failed");
                e.user_message()
            };
            Ok(LoginTemplate {
                page,
                email,
                next,
                error: Some(error),
            }
            .into_response())
        }
    }
}

/// Sign out. The backend call is best effort; the local session always ends.
#[instrument(skip(state, session, credentials))]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    credentials: VisitorCredentials,
) -> Result<Redirect> {
    if let Some(credentials) = credentials.as_ref() {
        if let Err(e) = state.backend().logout(credentials).await {
            tracing::warn!(error = %e, "Backend logout failed");
        }
    }

    clear_signed_in(&session).await?;
    clear_sentry_user();
    set_flash(&session, Flash::notice("You have been signed out.")).await;
    Ok(Redirect::to("/"))
}
