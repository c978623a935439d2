use crate::error::Error;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;

/// Result fanned out to every consumer of a shared in-flight request.
pub(crate) type Outcome = Result<Arc<Value>, Error>;

/// Book-keeping for one in-flight request.
///
/// The first caller for a key becomes the leader and runs the network call
/// in a spawned task; everyone (leader included) registers a waiter channel
/// here and awaits the task's outcome. The subscriber count tracks how many
/// callers still care: when it drops to zero before the task settles, the
/// task is aborted.
pub(crate) struct Inflight {
    started_at: DateTime<Utc>,
    waiters: Mutex<Vec<oneshot::Sender<Outcome>>>,
    subscribers: AtomicUsize,
    abort: Mutex<Option<AbortHandle>>,
}

impl Inflight {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            started_at: Utc::now(),
            waiters: Mutex::new(Vec::new()),
            subscribers: AtomicUsize::new(0),
            abort: Mutex::new(None),
        })
    }

    pub(crate) fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub(crate) fn set_abort_handle(&self, handle: AbortHandle) {
        *lock(&self.abort) = Some(handle);
    }

    /// Register a consumer; returns the receiving end of its channel.
    pub(crate) fn subscribe(&self) -> oneshot::Receiver<Outcome> {
        let (tx, rx) = oneshot::channel();
        lock(&self.waiters).push(tx);
        self.subscribers.fetch_add(1, Ordering::SeqCst);
        rx
    }

    /// Deliver the outcome to every registered consumer. Consumers that have
    /// stopped waiting are skipped silently.
    pub(crate) fn notify_waiters(&self, outcome: &Outcome) {
        let waiters = std::mem::take(&mut *lock(&self.waiters));
        log::debug!("notifying {} waiter(s) of request outcome", waiters.len());
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    /// Drop one consumer. Returns true when it was the last one.
    pub(crate) fn unsubscribe(&self) -> bool {
        self.subscribers.fetch_sub(1, Ordering::SeqCst) == 1
    }

    /// Abort the leader task, if it is still running.
    pub(crate) fn abort_leader(&self) {
        if let Some(handle) = lock(&self.abort).take() {
            handle.abort();
        }
    }
}

// Waiter registration must not be lost to a poisoned lock; a panic while
// holding either mutex leaves the data itself intact.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
