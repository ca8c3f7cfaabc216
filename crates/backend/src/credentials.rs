//! Backend credentials forwarded on behalf of a visitor.
//!
//! `POST /api/login` answers with a session cookie (and sometimes a bearer
//! token in the body). The front end keeps both in its own server session and
//! replays them on every backend call made for that visitor.

use reqwest::RequestBuilder;
use reqwest::header::COOKIE;
use serde::{Deserialize, Serialize};

/// A visitor's backend credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    cookie: Option<String>,
    token: Option<String>,
}

impl Credentials {
    /// Build credentials from `Set-Cookie` header values and an optional token.
    ///
    /// Only the `name=value` pair of each cookie is kept; attributes such as
    /// `Path` or `HttpOnly` are dropped. Returns `None` if nothing usable was
    /// found.
    pub fn from_login<'a>(
        set_cookies: impl IntoIterator<Item = &'a str>,
        token: Option<String>,
    ) -> Option<Self> {
        let pairs: Vec<&str> = set_cookies
            .into_iter()
            .filter_map(|header| header.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('=') && !pair.starts_with('='))
            .collect();

        let cookie = (!pairs.is_empty()).then(|| pairs.join("; "));
        let token = token.filter(|t| !t.trim().is_empty());

        if cookie.is_none() && token.is_none() {
            None
        } else {
            Some(Self { cookie, token })
        }
    }

    /// The `Cookie` header value replayed to the backend.
    #[must_use]
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// Attach the credentials to an outgoing request.
    pub(crate) fn apply(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("cookie", &self.cookie.as_ref().map(|_| "[REDACTED]"))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_name_value_pairs() {
        let creds = Credentials::from_login(
            [
                "connect.sid=s%3Aabc; Path=/; HttpOnly",
                "lang=es; Max-Age=3600",
            ],
            None,
        )
        .unwrap();
        assert_eq!(creds.cookie(), Some("connect.sid=s%3Aabc; lang=es"));
    }

    #[test]
    fn test_nothing_usable() {
        assert!(Credentials::from_login(["; Path=/", "=x"], Some("  ".into())).is_none());
        assert!(Credentials::from_login(std::iter::empty(), Some("tok".into())).is_some());
    }

    #[test]
    fn test_debug_redacts() {
        let creds = Credentials::from_login(["sid=secret"], Some("token".into())).unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("token\""));
        assert!(debug.contains("REDACTED"));
    }
}
