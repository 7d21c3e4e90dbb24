//! # Channel Queue
//!
//! The topic registry and its publishing side.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use booking_types::CancelToken;
use parking_lot::RwLock;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::subscription::Subscription;

/// Operations every queue implementation offers.
///
/// Each call takes a [`CancelToken`] and checks it before acting;
/// cancellation surfaces as [`QueueError::Cancelled`], never as a silent
/// success.
#[async_trait]
pub trait Queue<M: Send + 'static>: Send + Sync {
    /// Allocate a bounded buffer for `topic`. Idempotent.
    async fn create_topic(&self, cancel: &CancelToken, topic: &str) -> Result<(), QueueError>;

    /// Close and remove `topic`'s buffer. Idempotent; blocked publishers
    /// and subscribers observe the closure.
    async fn delete_topic(&self, cancel: &CancelToken, topic: &str) -> Result<(), QueueError>;

    /// Deliver `msg` to `topic`, waiting for buffer space if necessary.
    async fn publish(&self, cancel: &CancelToken, topic: &str, msg: M) -> Result<(), QueueError>;

    /// Deliver `msg` to `topic` without waiting; a full buffer fails
    /// immediately with [`QueueError::BufferFull`].
    async fn async_publish(
        &self,
        cancel: &CancelToken,
        topic: &str,
        msg: M,
    ) -> Result<(), QueueError>;

    /// Obtain a consuming handle on `topic`. Handles for the same topic
    /// compete for messages.
    async fn subscribe(
        &self,
        cancel: &CancelToken,
        topic: &str,
    ) -> Result<Subscription<M>, QueueError>;

    /// Close every topic. Subsequent operations fail with
    /// [`QueueError::QueueClosed`].
    async fn close(&self, cancel: &CancelToken) -> Result<(), QueueError>;
}

/// One topic's channel ends.
struct TopicSlot<M> {
    /// Long-lived sender keeping the channel open until deletion.
    tx: mpsc::Sender<M>,
    /// Receiver shared by competing consumers.
    receiver: Arc<Mutex<mpsc::Receiver<M>>>,
    /// Raised when the topic closes so blocked publishers wake up.
    closed_tx: watch::Sender<bool>,
}

/// Registry state behind one lock so the closed flag and the topic map
/// can never disagree.
struct Inner<M> {
    topics: HashMap<String, TopicSlot<M>>,
    closed: bool,
}

/// In-memory queue over bounded `tokio::sync::mpsc` channels.
///
/// Single-process only; a distributed deployment would put a broker
/// behind the same [`Queue`] trait.
pub struct ChannelQueue<M> {
    inner: RwLock<Inner<M>>,

    /// Active subscription count by topic.
    subscribers: Arc<RwLock<HashMap<String, usize>>>,

    /// Total messages accepted across all topics.
    events_published: AtomicU64,

    /// Per-topic buffer capacity.
    capacity: usize,
}

impl<M> ChannelQueue<M> {
    /// Create a queue with a validated configuration.
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        config.validate()?;
        Ok(Self {
            inner: RwLock::new(Inner {
                topics: HashMap::new(),
                closed: false,
            }),
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity: config.capacity,
        })
    }

    /// Per-topic buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total messages accepted across all topics.
    #[must_use]
    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    /// Number of live topics.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.inner.read().topics.len()
    }

    /// Number of active subscriptions on `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers.read().get(topic).copied().unwrap_or(0)
    }

    /// Cancellation and shutdown gate shared by every operation.
    fn guard(&self, cancel: &CancelToken) -> Result<(), QueueError> {
        if cancel.is_cancelled() {
            return Err(QueueError::Cancelled);
        }
        if self.inner.read().closed {
            return Err(QueueError::QueueClosed);
        }
        Ok(())
    }

    /// Clone the sending ends of `topic` without holding the registry
    /// lock across any await.
    fn publish_handles(
        &self,
        topic: &str,
    ) -> Result<(mpsc::Sender<M>, watch::Receiver<bool>), QueueError> {
        let inner = self.inner.read();
        let slot = inner
            .topics
            .get(topic)
            .ok_or_else(|| QueueError::TopicNotFound(topic.to_string()))?;
        Ok((slot.tx.clone(), slot.closed_tx.subscribe()))
    }
}

impl<M> Default for ChannelQueue<M> {
    fn default() -> Self {
        // The default configuration is valid by construction.
        Self {
            inner: RwLock::new(Inner {
                topics: HashMap::new(),
                closed: false,
            }),
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            events_published: AtomicU64::new(0),
            capacity: QueueConfig::default().capacity,
        }
    }
}

#[async_trait]
impl<M: Send + 'static> Queue<M> for ChannelQueue<M> {
    async fn create_topic(&self, cancel: &CancelToken, topic: &str) -> Result<(), QueueError> {
        self.guard(cancel)?;

        let mut inner = self.inner.write();
        if inner.closed {
            return Err(QueueError::QueueClosed);
        }
        if inner.topics.contains_key(topic) {
            debug!(topic, "Topic already exists");
            return Ok(());
        }

        let (tx, rx) = mpsc::channel(self.capacity);
        let (closed_tx, _) = watch::channel(false);
        inner.topics.insert(
            topic.to_string(),
            TopicSlot {
                tx,
                receiver: Arc::new(Mutex::new(rx)),
                closed_tx,
            },
        );
        debug!(topic, capacity = self.capacity, "Topic created");
        Ok(())
    }

    async fn delete_topic(&self, cancel: &CancelToken, topic: &str) -> Result<(), QueueError> {
        self.guard(cancel)?;

        let slot = self.inner.write().topics.remove(topic);
        match slot {
            Some(slot) => {
                // Wake blocked publishers before the sender drops.
                let _ = slot.closed_tx.send(true);
                debug!(topic, "Topic deleted");
            }
            None => debug!(topic, "Topic already absent"),
        }
        Ok(())
    }

    async fn publish(&self, cancel: &CancelToken, topic: &str, msg: M) -> Result<(), QueueError> {
        self.guard(cancel)?;
        let (tx, mut closed_rx) = self.publish_handles(topic)?;

        tokio::select! {
            _ = cancel.cancelled() => Err(QueueError::Cancelled),
            _ = closed_rx.wait_for(|closed| *closed) => {
                Err(QueueError::TopicClosed(topic.to_string()))
            }
            sent = tx.send(msg) => match sent {
                Ok(()) => {
                    self.events_published.fetch_add(1, Ordering::Relaxed);
                    debug!(topic, "Message published");
                    Ok(())
                }
                Err(_) => Err(QueueError::TopicClosed(topic.to_string())),
            },
        }
    }

    async fn async_publish(
        &self,
        cancel: &CancelToken,
        topic: &str,
        msg: M,
    ) -> Result<(), QueueError> {
        self.guard(cancel)?;
        let (tx, _closed_rx) = self.publish_handles(topic)?;

        match tx.try_send(msg) {
            Ok(()) => {
                self.events_published.fetch_add(1, Ordering::Relaxed);
                debug!(topic, "Message published");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(topic, "Buffer full, message rejected");
                Err(QueueError::BufferFull(topic.to_string()))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(QueueError::TopicClosed(topic.to_string()))
            }
        }
    }

    async fn subscribe(
        &self,
        cancel: &CancelToken,
        topic: &str,
    ) -> Result<Subscription<M>, QueueError> {
        self.guard(cancel)?;

        let receiver = {
            let inner = self.inner.read();
            let slot = inner
                .topics
                .get(topic)
                .ok_or_else(|| QueueError::TopicNotFound(topic.to_string()))?;
            Arc::clone(&slot.receiver)
        };

        *self
            .subscribers
            .write()
            .entry(topic.to_string())
            .or_insert(0) += 1;
        debug!(topic, "New subscription created");

        Ok(Subscription::new(
            topic.to_string(),
            receiver,
            Arc::clone(&self.subscribers),
        ))
    }

    async fn close(&self, cancel: &CancelToken) -> Result<(), QueueError> {
        if cancel.is_cancelled() {
            return Err(QueueError::Cancelled);
        }

        let mut inner = self.inner.write();
        if inner.closed {
            return Err(QueueError::QueueClosed);
        }
        inner.closed = true;

        for (topic, slot) in inner.topics.drain() {
            let _ = slot.closed_tx.send(true);
            debug!(topic = %topic, "Topic closed");
        }
        info!("Queue closed");
        Ok(())
    }
}
