//! Layout data for admin pages.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Datelike;
use tower_sessions::Session;

use crate::models::{CurrentAdmin, Flash, session_keys};

/// What the layout needs: who is signed in, where we are and the pending flash.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub admin_name: Option<String>,
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

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut context = Self {
            path: parts.uri.path().to_string(),
            year: chrono::Utc::now().year(),
            ..Self::default()
        };

        if let Some(session) = parts.extensions.get::<Session>() {
            context.admin_name = session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten()
                .map(|admin| admin.user.name);
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
