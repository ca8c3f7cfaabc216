//! Sign-in extractors and session helpers.
//!
//! Browsing and buying work without an account. A signed-in visitor has a
//! [`SessionUser`] for display and the backend [`Credentials`] forwarded on
//! their behalf.

use axum::{extract::FromRequestParts, http::request::Parts};
use safeuse_backend::{Credentials, Login, SessionUser};
use tower_sessions::Session;

use crate::models::session_keys;

/// Extractor that optionally gets the signed-in user.
pub struct OptionalAuth(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<SessionUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Extractor for the backend credentials of a signed-in visitor, if any.
pub struct VisitorCredentials(pub Option<Credentials>);

impl VisitorCredentials {
    #[must_use]
    pub const fn as_ref(&self) -> Option<&Credentials> {
        self.0.as_ref()
    }
}

impl<S> FromRequestParts<S> for VisitorCredentials
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let credentials = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<Credentials>(session_keys::CREDENTIALS)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(credentials))
    }
}

/// Store a successful login in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_signed_in(
    session: &Session,
    login: &Login,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_USER, &login.user)
        .await?;
    session
        .insert(session_keys::CREDENTIALS, &login.credentials)
        .await
}

/// Forget the signed-in user, keeping the cart.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_signed_in(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<SessionUser>(session_keys::CURRENT_USER)
        .await?;
    session
        .remove::<Credentials>(session_keys::CREDENTIALS)
        .await?;
    Ok(())
}
