//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Headers start locked down. The only loosening is for the hosted payment
//! element: its script and iframe come from `js.stripe.com` and it talks to
//! `api.stripe.com`. Catalog images are served by the SafeUse backend.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::middleware::CspNonce;
use crate::state::AppState;

const PAYMENT_SCRIPT_ORIGIN: &str = "https://js.stripe.com";
const PAYMENT_API_ORIGIN: &str = "https://api.stripe.com";

/// Build the CSP for a page rendered with `nonce`.
#[must_use]
pub fn content_security_policy(nonce: &str, asset_origin: &str) -> String {
    let script_nonce = if nonce.is_empty() {
        String::new()
    } else {
        format!(" 'nonce-{nonce}'")
    };

    format!(
        "default-src 'none'; \
         script-src 'self'{script_nonce} {PAYMENT_SCRIPT_ORIGIN}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' data: {asset_origin}; \
         connect-src 'self' {PAYMENT_API_ORIGIN}; \
         frame-src {PAYMENT_SCRIPT_ORIGIN}; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: no-referrer`
/// - `Content-Security-Policy` from [`content_security_policy`]
/// - `Permissions-Policy` denying sensors and media, allowing `payment` for
///   the payment element
/// - `Cache-Control: no-store` unless the handler chose its own
/// - `Cross-Origin-Opener-Policy` and `Cross-Origin-Resource-Policy`
/// - `X-DNS-Prefetch-Control: off`
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request
        .extensions()
        .get::<CspNonce>()
        .map(|n| n.value().to_string())
        .unwrap_or_default();
    let asset_origin = state.backend().base_url().origin().ascii_serialization();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    if let Ok(csp) = HeaderValue::from_str(&content_security_policy(&nonce, &asset_origin)) {
        headers.insert(CONTENT_SECURITY_POLICY, csp);
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             autoplay=(), \
             browsing-topics=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             midi=(), \
             payment=(self \"https://js.stripe.com\"), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    // COEP is left unset: the payment iframe does not send CORP headers.
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_carries_nonce_and_payment_origins() {
        let csp = content_security_policy("abc123", "https://api.safeuse.example");
        assert!(csp.contains("script-src 'self' 'nonce-abc123' https://js.stripe.com;"));
        assert!(csp.contains("frame-src https://js.stripe.com;"));
        assert!(csp.contains("connect-src 'self' https://api.stripe.com;"));
        assert!(csp.contains("img-src 'self' data: https://api.safeuse.example;"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn test_policy_without_nonce() {
        let csp = content_security_policy("", "http://localhost:4000");
        assert!(csp.contains("script-src 'self' https://js.stripe.com;"));
        assert!(!csp.contains("nonce-"));
    }
}
