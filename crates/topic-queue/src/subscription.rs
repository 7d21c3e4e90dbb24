//! # Subscription Handle
//!
//! The consuming side of a topic. Subscriptions to the same topic share
//! one receiver, so messages go to exactly one of the competing consumers
//! rather than fanning out.

use std::collections::HashMap;
use std::sync::Arc;

use booking_types::CancelToken;
use parking_lot::RwLock;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::error::QueueError;

/// A read handle on one topic's buffer.
///
/// When dropped, the subscription is removed from the queue's per-topic
/// subscriber count.
pub struct Subscription<M> {
    /// Topic this handle consumes from.
    topic: String,

    /// Receiver shared by every consumer of the topic.
    receiver: Arc<Mutex<mpsc::Receiver<M>>>,

    /// Reference to subscriber tracking (for cleanup).
    subscribers: Arc<RwLock<HashMap<String, usize>>>,
}

impl<M> Subscription<M> {
    pub(crate) fn new(
        topic: String,
        receiver: Arc<Mutex<mpsc::Receiver<M>>>,
        subscribers: Arc<RwLock<HashMap<String, usize>>>,
    ) -> Self {
        Self {
            topic,
            receiver,
            subscribers,
        }
    }

    /// The topic this subscription consumes.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next message.
    ///
    /// # Errors
    ///
    /// - [`QueueError::Cancelled`] once the token fires.
    /// - [`QueueError::Closed`] after the topic is deleted (or the queue
    ///   closed) and every buffered message has been drained.
    pub async fn recv(&self, cancel: &CancelToken) -> Result<M, QueueError> {
        if cancel.is_cancelled() {
            return Err(QueueError::Cancelled);
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(QueueError::Cancelled),
            msg = async { self.receiver.lock().await.recv().await } => {
                msg.ok_or(QueueError::Closed)
            }
        }
    }

    /// Take the next message without waiting.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(msg))` - a buffered message was available
    /// - `Ok(None)` - nothing buffered right now (or another consumer is
    ///   mid-receive; it will take the message anyway)
    /// - `Err(QueueError::Closed)` - topic gone and buffer drained
    pub fn try_recv(&self) -> Result<Option<M>, QueueError> {
        let Ok(mut receiver) = self.receiver.try_lock() else {
            return Ok(None);
        };
        match receiver.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(QueueError::Closed),
        }
    }
}

impl<M> Drop for Subscription<M> {
    fn drop(&mut self) {
        let mut subscribers = self.subscribers.write();
        let Some(count) = subscribers.get_mut(&self.topic) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            subscribers.remove(&self.topic);
        }
        debug!(topic = %self.topic, "Subscription dropped");
    }
}
