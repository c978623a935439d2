use crate::cancel::CancelToken;
use crate::dedupe::{Inflight, Outcome};
use crate::error::Error;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::{Arc, OnceLock};
use surf::http::Method;
use surf::Url;
use tokio::sync::oneshot;

/// Configuration for the request cache.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// How long a resolved GET response stays servable.
    pub request_ttl: Duration,
    /// How long a caller waits on another caller's in-flight request before
    /// giving up.
    pub pending_timeout: Duration,
    /// How often the background sweep runs.
    pub sweep_interval: Duration,
    /// Maximum number of cached entries.
    pub max_entries: usize,
    /// Whether caching and deduplication are enabled.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            request_ttl: Duration::seconds(30),
            pending_timeout: Duration::seconds(30),
            sweep_interval: Duration::seconds(60),
            max_entries: 1000,
            enabled: true,
        }
    }
}

impl CacheConfig {
    pub fn new(request_ttl: Duration, max_entries: usize, sweep_interval: Duration) -> Self {
        Self {
            request_ttl,
            sweep_interval,
            max_entries,
            ..Self::default()
        }
    }
}

/// Cache key derived from the full request shape: method, absolute URL and
/// serialized body. Identical requests always produce identical keys.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn from_request(method: Method, url: &Url, body: Option<&Value>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(method.to_string().as_bytes());
        hasher.update(url.as_str().as_bytes());
        if let Some(body) = body {
            hasher.update(body.to_string().as_bytes());
        }
        CacheKey(hex::encode(hasher.finalize()))
    }
}

/// A settled response plus the metadata needed to age it out.
#[derive(Clone, Debug)]
pub struct CachedResponse {
    data: Arc<Value>,
    created_at: DateTime<Utc>,
    ttl: Duration,
}

impl CachedResponse {
    fn new(data: Arc<Value>, ttl: Duration) -> Self {
        Self {
            data,
            created_at: Utc::now(),
            ttl,
        }
    }

    /// Check whether the entry is still within its TTL window.
    pub fn is_valid(&self) -> bool {
        Utc::now() < self.created_at + self.ttl
    }

    pub fn data(&self) -> Arc<Value> {
        self.data.clone()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// One slot per key: either the single in-flight request or its settled
/// response. Keeping both states in one map enforces the at-most-one-entry
/// invariant that deduplication depends on.
enum Slot {
    Pending(Arc<Inflight>),
    Resolved(CachedResponse),
}

/// In-memory request cache with deduplication of concurrent identical GETs.
///
/// An instance is plain shared state behind an `Arc`; nothing here is a
/// process-wide singleton, so tests can build isolated caches with their own
/// clocks-worth of TTLs.
pub struct RequestCache {
    entries: Arc<DashMap<CacheKey, Slot>>,
    config: CacheConfig,
    sweeper: OnceLock<tokio::task::JoinHandle<()>>,
}

impl RequestCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            config,
            sweeper: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Serve a fresh cached value, join an in-flight request, or become the
    /// leader and run `fetch`.
    ///
    /// The network call runs in a spawned task so that one caller's
    /// cancellation never tears it out from under the other subscribers;
    /// only when the last subscriber cancels is the task aborted. A
    /// cancelled caller resolves to `Ok(None)`.
    pub async fn fetch_with<F, Fut>(
        &self,
        key: CacheKey,
        ttl: Option<Duration>,
        cancel: Option<CancelToken>,
        fetch: F,
    ) -> Result<Option<Arc<Value>>, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, Error>> + Send + 'static,
    {
        if !self.config.enabled {
            return Self::fetch_direct(cancel, fetch).await;
        }

        self.ensure_sweeper();

        if self.entries.len() >= self.config.max_entries {
            self.make_room();
        }

        let ttl = ttl.unwrap_or(self.config.request_ttl);

        enum Decision {
            Hit(Arc<Value>),
            Join(Arc<Inflight>, oneshot::Receiver<Outcome>),
            Lead(Arc<Inflight>, oneshot::Receiver<Outcome>),
        }

        let decision = match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => match occupied.get() {
                Slot::Resolved(cached) if cached.is_valid() => {
                    log::debug!("cache hit for key {:?}", key);
                    Decision::Hit(cached.data())
                }
                Slot::Resolved(_) => {
                    log::debug!("cache expired for key {:?}", key);
                    let inflight = Inflight::new();
                    let rx = inflight.subscribe();
                    occupied.insert(Slot::Pending(inflight.clone()));
                    Decision::Lead(inflight, rx)
                }
                Slot::Pending(inflight) => {
                    log::debug!("joining in-flight request for key {:?}", key);
                    let inflight = inflight.clone();
                    let rx = inflight.subscribe();
                    Decision::Join(inflight, rx)
                }
            },
            Entry::Vacant(vacant) => {
                log::debug!("cache miss for key {:?}", key);
                let inflight = Inflight::new();
                let rx = inflight.subscribe();
                vacant.insert(Slot::Pending(inflight.clone()));
                Decision::Lead(inflight, rx)
            }
        };

        match decision {
            Decision::Hit(data) => Ok(Some(data)),
            Decision::Join(inflight, rx) => self.await_outcome(&key, inflight, rx, cancel).await,
            Decision::Lead(inflight, rx) => {
                self.spawn_leader(key.clone(), ttl, inflight.clone(), fetch);
                self.await_outcome(&key, inflight, rx, cancel).await
            }
        }
    }

    /// Caching disabled: straight to the network, still honoring the token.
    async fn fetch_direct<F, Fut>(
        cancel: Option<CancelToken>,
        fetch: F,
    ) -> Result<Option<Arc<Value>>, Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, Error>> + Send + 'static,
    {
        match cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => Ok(None),
                result = fetch() => result.map(|value| Some(Arc::new(value))),
            },
            None => fetch().await.map(|value| Some(Arc::new(value))),
        }
    }

    /// Run the network call in its own task. On success the slot flips to
    /// `Resolved` before waiters are notified; on failure the slot is
    /// removed first, so the next identical request starts fresh.
    fn spawn_leader<F, Fut>(&self, key: CacheKey, ttl: Duration, inflight: Arc<Inflight>, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, Error>> + Send + 'static,
    {
        let entries = self.entries.clone();
        let task_inflight = inflight.clone();
        let future = fetch();

        let handle = tokio::spawn(async move {
            let outcome: Outcome = future.await.map(Arc::new);

            match &outcome {
                Ok(data) => {
                    entries.insert(
                        key.clone(),
                        Slot::Resolved(CachedResponse::new(data.clone(), ttl)),
                    );
                }
                Err(err) => {
                    log::debug!("evicting failed request for key {:?}: {}", key, err);
                    entries.remove(&key);
                }
            }

            task_inflight.notify_waiters(&outcome);
        });

        inflight.set_abort_handle(handle.abort_handle());
    }

    async fn await_outcome(
        &self,
        key: &CacheKey,
        inflight: Arc<Inflight>,
        rx: oneshot::Receiver<Outcome>,
        cancel: Option<CancelToken>,
    ) -> Result<Option<Arc<Value>>, Error> {
        let _subscription = Subscription {
            entries: self.entries.clone(),
            key: key.clone(),
            inflight,
        };

        let wait = self
            .config
            .pending_timeout
            .to_std()
            .unwrap_or_else(|_| std::time::Duration::from_secs(30));

        let received = match cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => {
                    log::debug!("caller cancelled while awaiting key {:?}", key);
                    return Ok(None);
                }
                received = tokio::time::timeout(wait, rx) => received,
            },
            None => tokio::time::timeout(wait, rx).await,
        };

        match received {
            Ok(Ok(Ok(data))) => Ok(Some(data)),
            Ok(Ok(Err(err))) => Err(err),
            Ok(Err(_)) => Err(Error::Dedupe(
                "in-flight request went away before settling".to_string(),
            )),
            Err(_) => Err(Error::Dedupe(
                "timed out waiting for in-flight request".to_string(),
            )),
        }
    }

    /// Spawn the periodic sweep on first use; it needs a running runtime,
    /// which is guaranteed inside `fetch_with`.
    fn ensure_sweeper(&self) {
        self.sweeper.get_or_init(|| {
            let entries = self.entries.clone();
            let interval = self
                .config
                .sweep_interval
                .to_std()
                .unwrap_or_else(|_| std::time::Duration::from_secs(60));
            let pending_timeout = self.config.pending_timeout;

            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(interval).await;
                    let removed = sweep(&entries, pending_timeout);
                    if removed > 0 {
                        log::debug!("sweep removed {} cache entries", removed);
                    }
                }
            })
        });
    }

    /// Remove expired resolved entries.
    pub fn evict_expired(&self) {
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|entry| match entry.value() {
                Slot::Resolved(cached) => !cached.is_valid(),
                Slot::Pending(_) => false,
            })
            .map(|entry| entry.key().clone())
            .collect();

        let count = expired.len();
        for key in expired {
            self.entries.remove(&key);
        }
        log::debug!("evicted {} expired cache entries", count);
    }

    /// At capacity: drop expired entries first, then the oldest quarter of
    /// the resolved ones.
    fn make_room(&self) {
        self.evict_expired();

        if self.entries.len() < self.config.max_entries {
            return;
        }

        let mut resolved: Vec<(CacheKey, DateTime<Utc>)> = self
            .entries
            .iter()
            .filter_map(|entry| match entry.value() {
                Slot::Resolved(cached) => Some((entry.key().clone(), cached.created_at())),
                Slot::Pending(_) => None,
            })
            .collect();

        resolved.sort_by_key(|(_, created_at)| *created_at);

        let to_remove = (self.config.max_entries / 4).max(1);
        let mut removed = 0;
        for (key, _) in resolved.into_iter().take(to_remove) {
            self.entries.remove(&key);
            removed += 1;
        }
        log::debug!("evicted {} oldest cache entries", removed);
    }

    /// Drop every entry. In-flight requests keep running; their waiters time
    /// out and retry fresh.
    pub fn clear(&self) {
        self.entries.clear();
        log::info!("request cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let mut fresh = 0;
        let mut expired = 0;
        let mut pending = 0;

        for entry in self.entries.iter() {
            match entry.value() {
                Slot::Resolved(cached) if cached.is_valid() => fresh += 1,
                Slot::Resolved(_) => expired += 1,
                Slot::Pending(_) => pending += 1,
            }
        }

        CacheStats {
            total_entries: fresh + expired + pending,
            fresh_entries: fresh,
            expired_entries: expired,
            pending_requests: pending,
            max_entries: self.config.max_entries,
        }
    }
}

impl Drop for RequestCache {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get() {
            sweeper.abort();
        }
    }
}

fn sweep(entries: &DashMap<CacheKey, Slot>, pending_timeout: Duration) -> usize {
    let now = Utc::now();
    let stale: Vec<CacheKey> = entries
        .iter()
        .filter(|entry| match entry.value() {
            Slot::Resolved(cached) => !cached.is_valid(),
            // A pending slot this old means the leader is wedged; drop it so
            // the next caller starts over.
            Slot::Pending(inflight) => now - inflight.started_at() > pending_timeout,
        })
        .map(|entry| entry.key().clone())
        .collect();

    let count = stale.len();
    for key in stale {
        entries.remove(&key);
    }
    count
}

/// One caller's registration against an in-flight request. Dropping the last
/// registration while the flight is still pending aborts the leader task and
/// frees the slot.
struct Subscription {
    entries: Arc<DashMap<CacheKey, Slot>>,
    key: CacheKey,
    inflight: Arc<Inflight>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Take the slot's entry lock so a new caller cannot join this flight
        // between the last-subscriber check and the abort.
        if let Entry::Occupied(occupied) = self.entries.entry(self.key.clone()) {
            if let Slot::Pending(current) = occupied.get() {
                if Arc::ptr_eq(current, &self.inflight) {
                    if self.inflight.unsubscribe() {
                        log::debug!("last subscriber left key {:?}, aborting fetch", self.key);
                        self.inflight.abort_leader();
                        occupied.remove();
                    }
                    return;
                }
            }
        }

        // Slot already resolved, replaced or removed: just drop the
        // registration. Aborting here is a no-op for a settled task.
        if self.inflight.unsubscribe() {
            self.inflight.abort_leader();
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub expired_entries: usize,
    pub pending_requests: usize,
    pub max_entries: usize,
}

/// Thread-safe wrapper for the cache.
pub type SharedRequestCache = Arc<RequestCache>;
