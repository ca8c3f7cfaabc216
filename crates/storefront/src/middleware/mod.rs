//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with `request_id`, status, latency)
//! 3. Request ID
//! 4. CSP nonce
//! 5. Security headers (reads the nonce)
//! 6. Session layer (in-memory store)
//! 7. Cookie preferences (flushes writes to `Set-Cookie`)
//! 8. Rate limiting on form submissions (route layer)

pub mod auth;
pub mod csp;
pub mod preferences;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAuth, VisitorCredentials, clear_signed_in, set_signed_in};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use preferences::{CookiePreferences, preferences_middleware};
pub use rate_limit::form_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
