//! Per-request data every page layout needs.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Datelike;
use safeuse_backend::SessionUser;
use safeuse_core::cart::Cart;
use safeuse_core::preferences::COOKIE_CONSENT;
use tower_sessions::Session;

use crate::middleware::{CookiePreferences, CspNonce};
use crate::models::{Flash, session_keys};

/// Layout data: nonce, cookie banner, cart badge, signed-in name and flash.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub nonce: String,
    pub show_cookie_banner: bool,
    pub cart_units: u32,
    pub user_name: Option<String>,
    /// Path of the current page, used as the banner's `return_to`.
    pub path: String,
    pub flash: Option<Flash>,
    pub year: i32,
}

impl PageContext {
    /// Whether `href` is the current section, for nav highlighting.
    #[must_use]
    pub fn is_current(&self, href: &str) -> bool {
        if href == "/" {
            self.path == "/"
        } else {
            self.path == href || self.path.starts_with(&format!("{href}/"))
        }
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(CspNonce(nonce)) = CspNonce::from_request_parts(parts, state).await;
        let Ok(preferences) = CookiePreferences::from_request_parts(parts, state).await;

        let mut context = Self {
            nonce,
            show_cookie_banner: preferences.get(&COOKIE_CONSENT).is_none(),
            path: parts.uri.path().to_string(),
            year: chrono::Utc::now().year(),
            ..Self::default()
        };

        if let Some(session) = parts.extensions.get::<Session>() {
            context.cart_units = session
                .get::<Cart>(session_keys::CART)
                .await
                .ok()
                .flatten()
                .map_or(0, |cart| cart.units());
            context.user_name = session
                .get::<SessionUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten()
                .map(|user| user.name);
            context.flash = session
                .remove::<Flash>(session_keys::FLASH)
                .await
                .ok()
                .flatten();
        }

        Ok(context)
    }
}

/// Queue a message for the next rendered page.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_current() {
        let context = PageContext {
            path: "/substances/4".to_string(),
            ..PageContext::default()
        };
        assert!(context.is_current("/substances"));
        assert!(!context.is_current("/shop"));
        assert!(!context.is_current("/"));
    }
}
