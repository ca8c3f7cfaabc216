//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready  - Probes
//! GET  /                       - Home (featured substances, advice teaser)
//!
//! # Information
//! GET  /substances?q=          - Substance list with search
//! GET  /substances/{id}        - Substance detail
//! GET  /advice                 - Advice by stage of use
//! GET  /about, /legal          - Static pages
//!
//! # Shop
//! GET  /shop                   - Product grid
//! GET  /shop/{id}              - Product detail
//! GET  /cart                   - Cart with totals
//! POST /cart/add|update|remove - Cart mutations
//!
//! # Checkout
//! GET  /checkout               - Payment page
//! POST /checkout/intent        - Create payment intent (JSON)
//! POST /checkout/result        - Report confirmation outcome (JSON)
//! GET  /checkout/confirmation  - Transaction id, order creation
//!
//! # Visitor
//! GET  /contact, POST /contact - Contact form (POST rate limited)
//! POST /consent                - Cookie banner answer
//! GET  /login, POST /login     - Sign in (POST rate limited)
//! POST /logout                 - Sign out
//! ```

pub mod advice;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod consent;
pub mod contact;
pub mod health;
pub mod home;
pub mod pages;
pub mod shop;
pub mod substances;
pub mod views;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::form_rate_limiter;
use crate::state::AppState;

/// Only same-site relative paths are followed in redirects; anything else
/// goes home.
#[must_use]
pub fn local_path(path: &str) -> &str {
    let is_local = path.starts_with('/') && !path.starts_with("//") && !path.contains('\\');
    if is_local { path } else { "/" }
}

/// Create the substance routes router.
pub fn substance_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(substances::index))
        .route("/{id}", get(substances::show))
}

/// Create the shop routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shop::index))
        .route("/{id}", get(shop::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/intent", post(checkout::create_intent))
        .route("/result", post(checkout::report_result))
        .route("/confirmation", get(checkout::confirmation))
}

/// Form submissions behind the rate limiter.
pub fn limited_form_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/contact", post(contact::submit))
        .route_layer(form_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/", get(home::home))
        .nest("/substances", substance_routes())
        .route("/advice", get(advice::index))
        .nest("/shop", shop_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/contact", get(contact::show))
        .route("/login", get(auth::login_page))
        .merge(limited_form_routes())
        .route("/logout", post(auth::logout))
        .route("/consent", post(consent::update))
        .route("/about", get(pages::about))
        .route("/legal", get(pages::legal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path() {
        assert_eq!(local_path("/shop/3"), "/shop/3");
        assert_eq!(local_path("/substances?q=mdma"), "/substances?q=mdma");
        assert_eq!(local_path("//evil.example"), "/");
        assert_eq!(local_path("https://evil.example"), "/");
        assert_eq!(local_path("/\\evil.example"), "/");
        assert_eq!(local_path(""), "/");
    }
}
