//! Request plumbing shared by every endpoint.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, Response};
use safeuse_core::normalize::{Normalize, parse_list};
use safeuse_core::table::ManagedTable;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::cache::{CacheKey, CacheValue, Resource};
use crate::credentials::Credentials;
use crate::error::BackendError;

/// Settings for [`BackendClient::new`].
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend origin, e.g. `https://api.safeuse.es`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How long list responses stay cached.
    pub cache_ttl: Duration,
}

/// Client for the SafeUse backend API.
///
/// Cheap to clone; clones share the connection pool and the cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("safeuse-web/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(64)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// The backend origin.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve an image or file path served by the backend.
    ///
    /// Absolute URLs pass through; relative paths are joined to the backend
    /// origin.
    #[must_use]
    pub fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//")
        {
            return path.to_string();
        }
        self.inner
            .base_url
            .join(path.trim_start_matches("./"))
            .map_or_else(|_| path.to_string(), String::from)
    }

    // =========================================================================
    // Requests
    // =========================================================================

    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        credentials: Option<&Credentials>,
    ) -> Result<RequestBuilder, BackendError> {
        let url = self.inner.base_url.join(path)?;
        let request = self.inner.client.request(method, url);
        Ok(match credentials {
            Some(credentials) => credentials.apply(request),
            None => request,
        })
    }

    /// Send a request and fail on non-success statuses.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            warn!(status = %status, message = %message, "Backend returned non-success status");
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Read a response body as JSON. An empty body reads as `null`.
    pub(crate) async fn read_json(response: Response) -> Result<Value, BackendError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            warn!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// GET a path and return the raw JSON.
    #[instrument(skip(self, credentials))]
    pub async fn get_json(
        &self,
        path: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Value, BackendError> {
        let request = self.request(Method::GET, path, credentials)?;
        let response = self.send(request).await?;
        Self::read_json(response).await
    }

    /// Send a JSON body and return the JSON answer.
    pub(crate) async fn send_json<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        credentials: Option<&Credentials>,
    ) -> Result<Value, BackendError> {
        let request = self.request(method, path, credentials)?.json(body);
        let response = self.send(request).await?;
        Self::read_json(response).await
    }

    /// Send a JSON body when only the status matters. The answer is drained
    /// unread, so a plain-text acknowledgement still counts as success.
    pub(crate) async fn send_json_ignoring_body<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        credentials: Option<&Credentials>,
    ) -> Result<(), BackendError> {
        let request = self.request(method, path, credentials)?.json(body);
        let response = self.send(request).await?;
        if let Err(e) = response.bytes().await {
            debug!(error = %e, "Failed to drain backend response");
        }
        Ok(())
    }

    /// Read a success body that may or may not be JSON.
    pub(crate) async fn read_json_lenient(response: Response) -> Option<Value> {
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "Failed to read backend response");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(_) => {
                debug!(
                    body = %text.chars().take(200).collect::<String>(),
                    "Backend answered without JSON"
                );
                None
            }
        }
    }

    /// GET a list endpoint and normalize its rows, skipping invalid ones.
    #[instrument(skip(self, credentials), fields(entity = T::ENTITY))]
    pub async fn list<T: Normalize>(
        &self,
        path: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<T>, BackendError> {
        let raw = self.get_json(path, credentials).await?;
        let parsed = parse_list::<T>(&raw)?;
        for (index, error) in &parsed.skipped {
            warn!(index, error = %error, "Skipping invalid row");
        }
        debug!(rows = parsed.records.len(), skipped = parsed.skipped.len(), "Fetched list");
        Ok(parsed.records)
    }

    // =========================================================================
    // Cache
    // =========================================================================

    /// A cached table, or `None` on a miss.
    pub(crate) async fn cached<T: Resource>(&self, key: CacheKey) -> Option<ManagedTable<T>> {
        let table = self.inner.cache.get(&key).await.and_then(T::unwrap);
        if table.is_some() {
            debug!(?key, "Cache hit");
        }
        table
    }

    pub(crate) async fn store<T: Resource>(&self, key: CacheKey, table: ManagedTable<T>) {
        self.inner.cache.insert(key, T::wrap(table)).await;
    }

    /// Fetch a list through the cache.
    pub(crate) async fn table<T: Resource>(
        &self,
        key: CacheKey,
        path: &str,
        credentials: Option<&Credentials>,
    ) -> Result<ManagedTable<T>, BackendError> {
        if let Some(table) = self.cached::<T>(key).await {
            return Ok(table);
        }
        let table = ManagedTable::new(self.list::<T>(path, credentials).await?);
        self.store(key, table.clone()).await;
        Ok(table)
    }

    /// Apply a change to a cached table. A miss is left alone; the next read
    /// fetches fresh data anyway.
    pub(crate) async fn patch_cached<T: Resource>(
        &self,
        key: CacheKey,
        patch: impl FnOnce(&mut ManagedTable<T>),
    ) {
        if let Some(mut table) = self.cached::<T>(key).await {
            patch(&mut table);
            self.store(key, table).await;
        }
    }

    /// Drop one cached resource.
    pub async fn invalidate(&self, key: CacheKey) {
        debug!(?key, "Invalidating cache entry");
        self.inner.cache.invalidate(&key).await;
    }

    /// Drop every cached resource.
    pub fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
    }
}

/// Pull a readable message out of an error body.
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        ["message", "error", "mensaje", "msg"]
            .iter()
            .find_map(|key| json.get(key).and_then(Value::as_str).map(String::from))
    });
    from_json.unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> BackendClient {
        BackendClient::new(&BackendConfig {
            base_url: Url::parse("https://api.example.org/").unwrap(),
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(60),
        })
        .unwrap()
    }

    #[test]
    fn test_asset_url() {
        let client = client();
        assert_eq!(
            client.asset_url("/uploads/kit.png"),
            "https://api.example.org/uploads/kit.png"
        );
        assert_eq!(
            client.asset_url("uploads/kit.png"),
            "https://api.example.org/uploads/kit.png"
        );
        assert_eq!(
            client.asset_url("https://cdn.example.org/a.png"),
            "https://cdn.example.org/a.png"
        );
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"message":"Producto no encontrado"}"#), "Producto no encontrado");
        assert_eq!(error_message(r#"{"error":"unauthorized"}"#), "unauthorized");
        assert_eq!(error_message("Internal Server Error"), "Internal Server Error");
    }

    #[tokio::test]
    async fn test_patch_cached_ignores_miss() {
        use safeuse_core::records::User;

        let client = client();
        client
            .patch_cached::<User>(CacheKey::Users, |_| panic!("patch must not run on a miss"))
            .await;
        assert!(client.cached::<User>(CacheKey::Users).await.is_none());
    }

    #[tokio::test]
    async fn test_patch_cached_updates_hit() {
        use safeuse_core::records::User;
        use serde_json::json;

        let client = client();
        let user = User::from_value(&json!({ "id": 1, "email": "a@b.es" })).unwrap();
        client.store(CacheKey::Users, ManagedTable::new(vec![user])).await;
        client
            .patch_cached::<User>(CacheKey::Users, |table| {
                table.remove(safeuse_core::UserId::new(1));
            })
            .await;
        assert!(client.cached::<User>(CacheKey::Users).await.unwrap().is_empty());

        client.invalidate(CacheKey::Users).await;
        assert!(client.cached::<User>(CacheKey::Users).await.is_none());
    }
}
