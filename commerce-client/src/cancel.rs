use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cooperative cancellation handle tied to a caller's lifetime.
///
/// The caller keeps one clone and passes another with the request; calling
/// [`cancel`](CancelToken::cancel) makes the request resolve to `Ok(None)`
/// instead of waiting for the network. All clones observe the same signal.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](CancelToken::cancel) has been called.
    /// Resolves immediately when the token is already cancelled.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            let notified = self.inner.notify.notified();
            // Re-check after registering so a cancel between the flag load
            // and `notified()` cannot be missed.
            if self.is_cancelled() {
                break;
            }
            notified.await;
        }
    }
}
