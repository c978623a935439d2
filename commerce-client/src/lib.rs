pub mod cache;
mod cancel;
mod dedupe;
mod error;
mod mutation;
mod options;
pub mod resources;
mod transport;

pub mod auth;

#[cfg(test)]
mod tests;

pub use auth::{AuthState, Credentials, Session, StaffUser};
pub use cache::{
    CacheConfig, CacheKey, CacheStats, CachedResponse, RequestCache, SharedRequestCache,
};
pub use cancel::CancelToken;
pub use error::{Error, ErrorKind};
pub use mutation::OptimisticUpdate;
pub use options::RequestOptions;
pub use resources::{
    Catalog, Customers, Orders, OrderStatus, Page, Products, Quotes, QuoteStatus, Suppliers,
};
pub use surf::http::Method;
pub use transport::{HttpTransport, SurfTransport};

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use surf::Url;

/// Client for the admin backend: typed resource wrappers over a cached,
/// deduplicating request layer.
///
/// GET requests are deduplicated and served from cache within the configured
/// TTL; mutations always hit the network. Cloning is cheap and all clones
/// share the same cache and session.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    base_url: Url,
    cache: Option<SharedRequestCache>,
    auth: AuthState,
}

impl ApiClient {
    /// Client without caching; every GET hits the network.
    pub fn new(base_url: Url) -> Self {
        let auth = AuthState::new();
        let transport = Arc::new(SurfTransport::new(auth.clone()));
        Self {
            transport,
            base_url: normalize_base(base_url),
            cache: None,
            auth,
        }
    }

    /// Client with request caching and deduplication enabled.
    pub fn with_cache(base_url: Url, cache_config: CacheConfig) -> Self {
        let auth = AuthState::new();
        let transport = Arc::new(SurfTransport::new(auth.clone()));
        Self {
            transport,
            base_url: normalize_base(base_url),
            cache: Some(Arc::new(RequestCache::new(cache_config))),
            auth,
        }
    }

    /// Client over an arbitrary transport. This is the seam tests use to
    /// substitute a scripted backend.
    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        base_url: Url,
        cache_config: Option<CacheConfig>,
    ) -> Self {
        Self {
            transport,
            base_url: normalize_base(base_url),
            cache: cache_config.map(|config| Arc::new(RequestCache::new(config))),
            auth: AuthState::new(),
        }
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    /// Issue a request against a path relative to the base URL.
    ///
    /// Returns `Ok(None)` when the call was cancelled through the options'
    /// token; every genuine failure is an `Err`. GET requests go through the
    /// cache (unless deduplication is disabled per call or by config);
    /// everything else talks straight to the network.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<Option<Value>, Error> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| Error::InvalidUrl(format!("{path}: {err}")))?;

        let dedupe = options.dedupe.unwrap_or(method == Method::Get);
        let cancel = if options.cancel_on_teardown {
            options.cancel.clone()
        } else {
            None
        };

        match &self.cache {
            Some(cache) if dedupe && method == Method::Get => {
                let key = CacheKey::from_request(method, &url, body.as_ref());
                let transport = self.transport.clone();
                let fetch = move || async move { transport.send(method, url, body).await };
                let data = cache.fetch_with(key, options.ttl, cancel, fetch).await?;
                Ok(data.map(|value| (*value).clone()))
            }
            _ => self.dispatch(method, url, body, cancel).await,
        }
    }

    /// Uncached network call, racing the caller's cancellation token.
    async fn dispatch(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        cancel: Option<CancelToken>,
    ) -> Result<Option<Value>, Error> {
        match cancel {
            Some(token) => {
                let description = format!("{} {}", method, url);
                tokio::select! {
                    _ = token.cancelled() => {
                        log::debug!("{description} cancelled by caller teardown");
                        Ok(None)
                    }
                    result = self.transport.send(method, url, body) => result.map(Some),
                }
            }
            None => self.transport.send(method, url, body).await.map(Some),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, Error> {
        self.get_with(path, RequestOptions::default()).await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, Error> {
        self.request(Method::Get, path, None, options)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<Option<T>, Error> {
        self.request(Method::Post, path, Some(body), RequestOptions::default())
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<Option<T>, Error> {
        self.request(Method::Put, path, Some(body), RequestOptions::default())
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn delete(&self, path: &str) -> Result<Option<Value>, Error> {
        self.request(Method::Delete, path, None, RequestOptions::default())
            .await
    }

    pub fn customers(&self) -> Customers<'_> {
        Customers::new(self)
    }

    pub fn orders(&self) -> Orders<'_> {
        Orders::new(self)
    }

    pub fn quotes(&self) -> Quotes<'_> {
        Quotes::new(self)
    }

    pub fn products(&self) -> Products<'_> {
        Products::new(self)
    }

    pub fn suppliers(&self) -> Suppliers<'_> {
        Suppliers::new(self)
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::new(self)
    }

    /// Cache statistics, when caching is enabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    /// Drop all cached responses.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Remove expired cache entries immediately instead of waiting for the
    /// background sweep.
    pub fn evict_expired_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.evict_expired();
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value(value).map_err(|err| Error::Decode(err.to_string()))
}

/// `Url::join` treats a base without a trailing slash as a file, replacing
/// the last path segment. Normalize once so relative resource paths append.
fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base
}
