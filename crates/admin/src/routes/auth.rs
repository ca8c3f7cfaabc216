//! Admin sign-in against the SafeUse backend.
//!
//! The backend checks the password; the panel only admits accounts whose
//! role is admin.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::{CurrentAdmin, Flash};
use crate::page::{PageContext, set_flash};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub email: String,
    pub error: Option<String>,
}

/// Login page; a signed-in admin goes straight to the dashboard.
pub async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth, page: PageContext) -> Response {
    if admin.is_some_and(|admin| admin.user.role.is_admin()) {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        page,
        email: String::new(),
        error: None,
    }
    .into_response()
}

#[instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_string();
    let password = SecretString::from(form.password);

    let error = match state.backend().login(&email, &password).await {
        Ok(login) if login.user.role.is_admin() => {
            set_current_admin(
                &session,
                &CurrentAdmin {
                    user: login.user.clone(),
                    credentials: login.credentials,
                },
            )
            .await?;
            set_sentry_user(&login.user.id, Some(&login.user.email));
            tracing::info!(admin_id = %login.user.id, "Admin signed in");
            return Ok(Redirect::to("/").into_response());
        }
        Ok(login) => {
            tracing::warn!(user_id = %login.user.id, "Non-admin account tried the back office");
            if let Err(e) = state.backend().logout(&login.credentials).await {
                tracing::warn!(error = %e, "Backend logout failed");
            }
            "This account cannot use the back office.".to_string()
        }
        Err(e) if e.is_unauthorized() => "Incorrect email or password.".to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Login request failed");
            e.user_message()
        }
    };

    Ok(LoginTemplate {
        page,
        email,
        error: Some(error),
    }
    .into_response())
}

/// Sign out. The backend call is best effort; the local session always ends.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAdminAuth(admin): OptionalAdminAuth,
) -> Result<Redirect> {
    if let Some(admin) = admin {
        if let Err(e) = state.backend().logout(&admin.credentials).await {
            tracing::warn!(error = %e, "Backend logout failed");
        }
    }

    clear_current_admin(&session).await?;
    clear_sentry_user();
    set_flash(&session, Flash::notice("Signed out.")).await;
    Ok(Redirect::to("/login"))
}
