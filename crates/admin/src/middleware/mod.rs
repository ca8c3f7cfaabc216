//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with `request_id`, status, latency)
//! 3. Request ID
//! 4. Security headers (no scripts at all)
//! 5. Session layer (in-memory store, `SameSite=Strict`)
//! 6. Rate limiting on `POST /login` (route layer)
//! 7. Auth guard ([`RequireAdminAuth`] extractor on every page but login)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAdminAuth, RequireAdminAuth, clear_current_admin, set_current_admin,
};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
