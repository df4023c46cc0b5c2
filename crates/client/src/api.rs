//! HTTP transport for the dealership backend.
//!
//! [`DashboardApi`] wraps a [`reqwest::Client`], the shared
//! [`SessionContext`], the tag-based [`QueryCache`] and a
//! [`CancellationToken`]. Every request carries `Accept-Language` from the
//! session locale and, when signed in, a bearer token.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use dealerdash_core::locale::Locale;
use dealerdash_core::permissions::{Action, Module};
use dealerdash_core::session::Session;

use crate::cache::QueryCache;
use crate::error::{ClientError, ClientResult, GENERIC_ERROR_MESSAGE};
use crate::response::{DataResponse, ErrorBody};

/// Session shared between the composition root and the client.
pub type SessionContext = Arc<RwLock<Session>>;

/// Wrap a session for sharing.
pub fn session_context(session: Session) -> SessionContext {
    Arc::new(RwLock::new(session))
}

/// Typed client for the dashboard REST API.
#[derive(Clone)]
pub struct DashboardApi {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
    cache: QueryCache,
    cancel: CancellationToken,
}

impl DashboardApi {
    /// Create a client with its own connection pool.
    ///
    /// * `base_url` - versioned API root, e.g. `http://host:4000/api/v1`.
    /// * `timeout`  - per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        session: SessionContext,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, session))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        session: SessionContext,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            cache: QueryCache::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// A handle sharing pool, session and cache whose in-flight requests can
    /// be cancelled together without affecting the parent.
    pub fn scoped(&self) -> Self {
        let mut scoped = self.clone();
        scoped.cancel = self.cancel.child_token();
        scoped
    }

    /// Cancel every in-flight and future request made through this handle
    /// (and its scoped children).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // ---- request building ----

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let session = self.session.read().await;
        tracing::debug!(%method, path, "Building API request");
        let builder = self
            .client
            .request(method, self.url(path))
            .header(ACCEPT_LANGUAGE, session.locale().as_str());
        match session.token() {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    /// Check the signed-in admin may perform `action` on `module`.
    pub async fn authorize(&self, module: Module, action: Action) -> ClientResult<()> {
        Ok(self.session.read().await.authorize(module, action)?)
    }

    // ---- execution ----

    /// Send the request, honoring cancellation, and require a 2xx status.
    pub(crate) async fn execute(&self, builder: RequestBuilder) -> ClientResult<reqwest::Response> {
        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
            result = builder.send() => result?,
        };
        Self::ensure_success(response).await
    }

    /// Decode a 2xx JSON body.
    pub(crate) async fn fetch_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> ClientResult<T> {
        let response = self.execute(builder).await?;
        let bytes = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
            result = response.bytes() => result?,
        };
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Decode a `{ "data": T }` body.
    pub(crate) async fn fetch_data<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> ClientResult<T> {
        Ok(self.fetch_json::<DataResponse<T>>(builder).await?.data)
    }

    /// Send the request and discard the body.
    pub(crate) async fn fetch_empty(&self, builder: RequestBuilder) -> ClientResult<()> {
        self.execute(builder).await?;
        Ok(())
    }

    /// `GET path?query`, served from the cache when possible. The whole
    /// response body is cached under `tag`, keyed by the session locale as
    /// well since the server localizes rows by `Accept-Language`.
    pub(crate) async fn get_cached<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        tag: &str,
    ) -> ClientResult<T> {
        let locale = self.session.read().await.locale();
        let key = cache_key(locale, path, query);
        let body = match self.cache.get(&key).await {
            Some(body) => body,
            None => {
                let builder = self.request(Method::GET, path).await.query(query);
                let body: serde_json::Value = self.fetch_json(builder).await?;
                self.cache.put(&key, tag, body.clone()).await;
                body
            }
        };
        serde_json::from_value(body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Turn a non-2xx response into [`ClientError::Api`] with the server's
    /// message, or a generic one.
    async fn ensure_success(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
        tracing::warn!(status = status.as_u16(), %message, "API request failed");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn cache_key(locale: Locale, path: &str, query: &[(&str, String)]) -> String {
    // JSON keeps keys unambiguous whatever the query values contain.
    serde_json::json!([locale.as_str(), path, query]).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_double_slashes() {
        let api = DashboardApi::with_client(
            reqwest::Client::new(),
            "http://localhost:4000/api/v1/",
            session_context(Session::anonymous(Locale::En)),
        );
        assert_eq!(api.url("/cars"), "http://localhost:4000/api/v1/cars");
        assert_eq!(api.url("brand"), "http://localhost:4000/api/v1/brand");
    }

    #[test]
    fn cache_key_includes_locale_and_query() {
        let query = [("page", "2".to_string()), ("search", "bmw".to_string())];
        assert_eq!(
            cache_key(Locale::En, "/cars", &query),
            r#"["en","/cars",[["page","2"],["search","bmw"]]]"#
        );
        assert_ne!(
            cache_key(Locale::En, "/cars", &query),
            cache_key(Locale::Ar, "/cars", &query)
        );
        assert_eq!(cache_key(Locale::Ar, "/brand", &[]), r#"["ar","/brand",[]]"#);
    }

    #[test]
    fn cache_key_separators_in_values_do_not_collide() {
        let joined = [("search", "a&page=2".to_string())];
        let split = [("search", "a".to_string()), ("page", "2".to_string())];
        assert_ne!(
            cache_key(Locale::En, "/cars", &joined),
            cache_key(Locale::En, "/cars", &split)
        );
    }

    #[test]
    fn scoped_cancel_does_not_cancel_parent() {
        let api = DashboardApi::with_client(
            reqwest::Client::new(),
            "http://localhost",
            session_context(Session::default()),
        );
        let scoped = api.scoped();
        scoped.cancel();
        assert!(scoped.cancellation_token().is_cancelled());
        assert!(!api.cancellation_token().is_cancelled());
    }
}
