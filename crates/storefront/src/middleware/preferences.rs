//! Cookie-backed visitor preferences.
//!
//! The middleware loads every request cookie into a [`Preferences`] store,
//! hands it to handlers through request extensions and, once the handler has
//! answered, turns each recorded write into a `Set-Cookie` header.

use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use safeuse_core::preferences::{
    MapStore, PreferenceChange, PreferenceKey, PreferenceValue, Preferences,
};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use crate::state::AppState;

/// The current request's preferences. Clones share the same store.
#[derive(Clone, Default)]
pub struct CookiePreferences(Arc<Mutex<Preferences<MapStore>>>);

impl CookiePreferences {
    /// Load the preferences sent in the request's `Cookie` headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let store: MapStore = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
            .collect();

        Self(Arc::new(Mutex::new(Preferences::new(store))))
    }

    pub fn get<T: PreferenceValue>(&self, key: &PreferenceKey<T>) -> Option<T> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).get(key)
    }

    pub fn set<T: PreferenceValue>(&self, key: &PreferenceKey<T>, value: &T) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set(key, value);
    }

    fn take_changes(&self) -> Vec<PreferenceChange> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take_changes()
    }
}

/// Render one pending write as a `Set-Cookie` value.
#[must_use]
pub fn set_cookie_value(change: &PreferenceChange, secure: bool) -> Option<HeaderValue> {
    let builder = match change {
        PreferenceChange::Set {
            name,
            value,
            max_age,
        } => Cookie::build((*name, value.clone())).max_age(Duration::seconds(
            i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX),
        )),
        PreferenceChange::Removed { name } => Cookie::build((*name, "")).removal(),
    };

    let cookie = builder
        .path("/")
        .same_site(SameSite::Lax)
        .http_only(true)
        .secure(secure)
        .build();

    HeaderValue::from_str(&cookie.to_string()).ok()
}

/// Load preferences for the handler and flush its writes to the response.
pub async fn preferences_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let preferences = CookiePreferences::from_headers(request.headers());
    request.extensions_mut().insert(preferences.clone());

    let mut response = next.run(request).await;

    let secure = state.config().is_secure();
    for change in preferences.take_changes() {
        if let Some(value) = set_cookie_value(&change, secure) {
            response.headers_mut().append(header::SET_COOKIE, value);
        } else {
            tracing::warn!(?change, "Preference could not be encoded as a cookie");
        }
    }

    response
}

impl<S> FromRequestParts<S> for CookiePreferences
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!("Preferences not found in request extensions - middleware may be misconfigured");
            Self::default()
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use safeuse_core::preferences::{COOKIE_CONSENT, CookieConsent};

    use super::*;

    #[test]
    fn test_reads_consent_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("safeuse_session=abc; safeuse_cookie_consent=rejected"),
        );
        let preferences = CookiePreferences::from_headers(&headers);
        assert_eq!(preferences.get(&COOKIE_CONSENT), Some(CookieConsent::Rejected));
    }

    #[test]
    fn test_missing_cookie_reads_none() {
        let preferences = CookiePreferences::from_headers(&HeaderMap::new());
        assert_eq!(preferences.get(&COOKIE_CONSENT), None);
        assert!(preferences.take_changes().is_empty());
    }

    #[test]
    fn test_set_cookie_for_one_year() {
        let preferences = CookiePreferences::default();
        preferences.set(&COOKIE_CONSENT, &CookieConsent::Accepted);

        let changes = preferences.take_changes();
        assert_eq!(changes.len(), 1);
        let value = set_cookie_value(changes.first().unwrap(), true).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("safeuse_cookie_consent=accepted"));
        assert!(value.contains("Max-Age=31536000"));
        assert!(value.contains("Secure"));
        assert!(value.contains("SameSite=Lax"));
    }

    #[test]
    fn test_removal_expires_cookie() {
        let change = PreferenceChange::Removed {
            name: "safeuse_cookie_consent",
        };
        let value = set_cookie_value(&change, false).unwrap();
        assert!(value.to_str().unwrap().contains("Max-Age=0"));
    }
}
