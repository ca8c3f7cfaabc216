//! Login and logout against the backend.

use reqwest::Method;
use reqwest::header::SET_COOKIE;
use safeuse_core::normalize::{Fields, Normalize, unwrap_object};
use safeuse_core::records::User;
use safeuse_core::types::{UserId, UserRole};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::client::BackendClient;
use crate::credentials::Credentials;
use crate::error::BackendError;
use crate::paths;

/// The signed-in user, as kept in the front end's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct Login {
    pub user: SessionUser,
    pub credentials: Credentials,
}

impl BackendClient {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Api`] with status 401 if the backend rejects
    /// the credentials or hands back no session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Login, BackendError> {
        let request = self.request(Method::POST, paths::LOGIN, None)?.json(&json!({
            "email": email,
            "password": password.expose_secret(),
        }));
        let response = self.send(request).await?;

        let set_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(String::from)
            .collect();
        let body = Self::read_json(response).await?;

        let token = Fields::of("login", &body)
            .ok()
            .and_then(|fields| fields.text(&["token", "accessToken", "access_token"]));
        let credentials = Credentials::from_login(set_cookies.iter().map(String::as_str), token)
            .ok_or_else(|| {
                warn!("Login succeeded without a session cookie or token");
                BackendError::Api {
                    status: 401,
                    message: "no session returned".to_string(),
                }
            })?;

        let user = session_user(&body, email);
        info!(user_id = %user.id, role = user.role.label(), "Signed in");
        Ok(Login { user, credentials })
    }

    /// Sign out. Callers treat failure as best effort.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the logout.
    #[instrument(skip(self, credentials))]
    pub async fn logout(&self, credentials: &Credentials) -> Result<(), BackendError> {
        self.send_json_ignoring_body(Method::POST, paths::LOGOUT, &json!({}), Some(credentials))
            .await
    }
}

/// The user described by a login answer, falling back to the email typed in.
fn session_user(body: &Value, email: &str) -> SessionUser {
    let raw = unwrap_object(body, &["user", "usuario", "data"]);
    match User::from_value(raw) {
        Ok(user) => SessionUser {
            name: user.display_name().to_string(),
            id: user.id,
            email: user.email,
            role: user.role,
        },
        Err(_) => SessionUser {
            id: UserId::default(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            role: UserRole::Customer,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_user_from_nested_user() {
        let body = json!({ "token": "t", "user": {
            "ID_Usuario": 3, "Nombre": "Ana", "Email": "ana@b.es", "Rol": "admin"
        }});
        let user = session_user(&body, "ana@b.es");
        assert_eq!(user.id, UserId::new(3));
        assert_eq!(user.name, "Ana");
        assert!(user.role.is_admin());
    }

    #[test]
    fn test_session_user_fallback() {
        let user = session_user(&json!({ "ok": true }), "visitor@b.es");
        assert_eq!(user.name, "visitor");
        assert_eq!(user.role, UserRole::Customer);
    }
}
