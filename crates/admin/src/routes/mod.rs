//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Health check
//! GET  /login, POST /login         - Sign in (POST rate limited)
//! POST /logout                     - Sign out
//! GET  /                           - Dashboard (counts)
//!
//! GET  /users?q=                   - Users
//! GET  /products?q=                - Products
//! GET  /products/new, POST /products
//! GET  /products/{id}/edit, POST /products/{id}
//! POST /products/{id}/delete
//! GET  /substances?q=, POST /substances/{id}/delete
//! GET  /advice?q=,     POST /advice/{id}/delete
//! GET  /orders?q=,     POST /orders/{id}/delete
//! GET  /contacts?q=,   POST /contacts/{id}/toggle, POST /contacts/{id}/delete
//! ```
//!
//! Every row action posts the active filter back as `q`, and the redirect
//! returns to the same filtered list with the outcome as a flash message.

pub mod advice;
pub mod auth;
pub mod contacts;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod products;
pub mod substances;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};
use safeuse_backend::BackendError;
use safeuse_core::fetch::Fetched;
use serde::Deserialize;
use tower_sessions::Session;

use crate::components::list_url;
use crate::error::{AppError, Result};
use crate::middleware::login_rate_limiter;
use crate::models::Flash;
use crate::page::set_flash;
use crate::state::AppState;

/// Largest accepted product form, image included.
const PRODUCT_FORM_LIMIT: usize = 8 * 1024 * 1024;

/// `?q=` on list pages.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: String,
}

/// Body of every row action form.
#[derive(Debug, Default, Deserialize)]
pub struct RowActionForm {
    /// The filter active when the action was posted.
    #[serde(default)]
    pub q: String,
}

/// Turn a list read into the section it renders.
///
/// Rejected credentials propagate so the admin is sent to sign in again;
/// other failures render inline.
fn fetched<T>(result: std::result::Result<T, BackendError>, what: &str) -> Result<Fetched<T>> {
    match result {
        Ok(data) => Ok(Fetched::Ready(data)),
        Err(e) if e.is_unauthorized() => Err(AppError::Backend(e)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load {what}");
            Ok(Fetched::Failed(e.user_message()))
        }
    }
}

/// Flash the outcome of a row mutation and go back to the filtered list.
///
/// Rejected credentials propagate so the admin is sent to sign in again;
/// any other failure becomes an alert and the list is left as it was.
async fn finish_mutation<T>(
    session: &Session,
    result: std::result::Result<T, BackendError>,
    table_id: &str,
    query: &str,
    success: impl FnOnce(T) -> String,
    failure: &str,
) -> Result<Redirect> {
    match result {
        Ok(value) => set_flash(session, Flash::notice(success(value))).await,
        Err(e) if e.is_unauthorized() => return Err(AppError::Backend(e)),
        Err(e) => {
            tracing::warn!(error = %e, table = table_id, "Mutation failed");
            set_flash(
                session,
                Flash::error(format!("{failure} {}", e.user_message())),
            )
            .await;
        }
    }
    Ok(Redirect::to(&list_url(table_id, query)))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit))
        .route("/{id}/delete", post(products::delete))
        .layer(DefaultBodyLimit::max(PRODUCT_FORM_LIMIT))
}

/// Create the contact routes router.
pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(contacts::index))
        .route("/{id}/toggle", post(contacts::toggle))
        .route("/{id}/delete", post(contacts::delete))
}

/// `POST /login` behind the rate limiter.
fn limited_login_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route_layer(login_rate_limiter())
}

/// Build the complete admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/login", get(auth::login_page))
        .route("/logout", post(auth::logout))
        .merge(limited_login_routes())
        .route("/", get(dashboard::index))
        .route("/users", get(users::index))
        .nest("/products", product_routes())
        .route("/substances", get(substances::index))
        .route("/substances/{id}/delete", post(substances::delete))
        .route("/advice", get(advice::index))
        .route("/advice/{id}/delete", post(advice::delete))
        .route("/orders", get(orders::index))
        .route("/orders/{id}/delete", post(orders::delete))
        .nest("/contacts", contact_routes())
}
