use crate::cancel::CancelToken;
use chrono::Duration;

/// Per-call overrides for [`ApiClient::request`](crate::ApiClient::request).
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub(crate) ttl: Option<Duration>,
    pub(crate) dedupe: Option<bool>,
    pub(crate) cancel: Option<CancelToken>,
    pub(crate) cancel_on_teardown: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            ttl: None,
            dedupe: None,
            cancel: None,
            cancel_on_teardown: true,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the cache TTL for this call only.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Force deduplication on or off for this call. The default is on for
    /// GET and off for everything else; non-GET methods bypass the cache
    /// regardless of this flag.
    pub fn dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = Some(dedupe);
        self
    }

    /// Attach a cancellation token owned by the caller.
    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// When disabled, the attached token is ignored and the call runs to
    /// completion even if the caller goes away. Enabled by default.
    pub fn cancel_on_teardown(mut self, enabled: bool) -> Self {
        self.cancel_on_teardown = enabled;
        self
    }
}
