//! Security headers for the admin panel.
//!
//! Stricter than the storefront: the panel runs no scripts at all, so the CSP
//! only admits same-origin styles and images plus product images from the
//! backend.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

#[must_use]
pub fn content_security_policy(asset_origin: &str) -> String {
    format!(
        "default-src 'none'; \
         script-src 'none'; \
         style-src 'self'; \
         img-src 'self' data: {asset_origin}; \
         form-action 'self'; \
         base-uri 'none'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let asset_origin = state.backend().base_url().origin().ascii_serialization();
    let secure = state.config().is_secure();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    if let Ok(csp) = HeaderValue::from_str(&content_security_policy(&asset_origin)) {
        headers.insert(CONTENT_SECURITY_POLICY, csp);
    }
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    if secure {
        headers.insert(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_blocks_scripts() {
        let csp = content_security_policy("https://api.safeuse.example");
        assert!(csp.contains("script-src 'none';"));
        assert!(csp.contains("img-src 'self' data: https://api.safeuse.example;"));
        assert!(csp.ends_with("frame-ancestors 'none'"));
    }
}
