//! Cooperative cancellation for queue and repository operations.
//!
//! A [`CancelSource`] is held by whoever decides shutdown (the node
//! binary, a test); cloned [`CancelToken`]s travel into every blocking
//! operation so it can fail fast with a distinguishable cancellation
//! error instead of hanging. Backed by a `tokio::sync::watch` channel.

use tokio::sync::watch;

/// The signalling side. Dropping the source counts as cancellation, so
/// process teardown unblocks every waiter even without an explicit call.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Hand out a token observing this source.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Fire the signal. Idempotent, and latches even when no token is
    /// currently subscribed.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// The observing side, cheap to clone and pass by reference into
/// operations.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Whether the signal has already fired (or the source is gone).
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Wait until the signal fires. Completes immediately when it
    /// already has, and when the source was dropped.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        loop {
            if rx.changed().await.is_err() {
                // Source dropped: the process is tearing down.
                return;
            }
            if *rx.borrow() {
                return;
            }
        }
    }
}
