//! Outbound (driven) ports for the booking pipeline.
//!
//! The saga only ever talks to persistence through [`KeyedStore`], so the
//! in-memory adapter can be swapped for a real database without touching
//! the service layer.

use async_trait::async_trait;
use booking_types::CancelToken;

use crate::error::StoreError;

/// Generic keyed collection with CRUD semantics.
///
/// Every call observes the caller's [`CancelToken`]: once the token fires,
/// implementations return [`StoreError::Cancelled`] instead of touching
/// the underlying data.
///
/// # Errors
/// - [`StoreError::DuplicateConstraint`]: `create` on an existing key
/// - [`StoreError::NotFound`]: `read`, `update`, or `delete` on a missing key
/// - [`StoreError::Cancelled`]: the token fired first
#[async_trait]
pub trait KeyedStore<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    /// Inserts a new record. The existing value is left untouched when the
    /// key is already present.
    async fn create(&self, cancel: &CancelToken, key: K, value: V) -> Result<(), StoreError>;

    /// Returns a copy of the record under `key`.
    async fn read(&self, cancel: &CancelToken, key: &K) -> Result<V, StoreError>;

    /// Replaces the record under `key`.
    async fn update(&self, cancel: &CancelToken, key: &K, value: V) -> Result<(), StoreError>;

    /// Removes the record under `key`.
    async fn delete(&self, cancel: &CancelToken, key: &K) -> Result<(), StoreError>;

    /// Returns a snapshot of every record, in no particular order.
    async fn list(&self, cancel: &CancelToken) -> Result<Vec<V>, StoreError>;
}

/// Store wrapper with scripted failures, for steering a saga run into its
/// failure paths at an exact step.
#[cfg(test)]
pub struct FailingStore<K, V> {
    inner: crate::adapters::memory::MemoryStore<K, V>,
    plan: parking_lot::Mutex<FailPlan>,
}

#[cfg(test)]
struct FailPlan {
    pass_updates: usize,
    fail_updates: usize,
    fail_lists: bool,
}

#[cfg(test)]
impl<K, V> FailingStore<K, V>
where
    K: Clone + Eq + std::hash::Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Updates succeed `pass` times, fail the next `fail` times, then
    /// succeed again. Reads and lists always pass through.
    pub fn failing_updates(
        inner: crate::adapters::memory::MemoryStore<K, V>,
        pass: usize,
        fail: usize,
    ) -> Self {
        Self {
            inner,
            plan: parking_lot::Mutex::new(FailPlan {
                pass_updates: pass,
                fail_updates: fail,
                fail_lists: false,
            }),
        }
    }

    /// Every `list` call fails; everything else passes through.
    pub fn failing_lists(inner: crate::adapters::memory::MemoryStore<K, V>) -> Self {
        Self {
            inner,
            plan: parking_lot::Mutex::new(FailPlan {
                pass_updates: usize::MAX,
                fail_updates: 0,
                fail_lists: true,
            }),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl<K, V> KeyedStore<K, V> for FailingStore<K, V>
where
    K: Clone + Eq + std::hash::Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn create(&self, cancel: &CancelToken, key: K, value: V) -> Result<(), StoreError> {
        self.inner.create(cancel, key, value).await
    }

    async fn read(&self, cancel: &CancelToken, key: &K) -> Result<V, StoreError> {
        self.inner.read(cancel, key).await
    }

    async fn update(&self, cancel: &CancelToken, key: &K, value: V) -> Result<(), StoreError> {
        {
            let mut plan = self.plan.lock();
            if plan.pass_updates > 0 {
                plan.pass_updates -= 1;
            } else if plan.fail_updates > 0 {
                plan.fail_updates -= 1;
                return Err(StoreError::NotFound);
            }
        }
        self.inner.update(cancel, key, value).await
    }

    async fn delete(&self, cancel: &CancelToken, key: &K) -> Result<(), StoreError> {
        self.inner.delete(cancel, key).await
    }

    async fn list(&self, cancel: &CancelToken) -> Result<Vec<V>, StoreError> {
        if self.plan.lock().fail_lists {
            return Err(StoreError::NotFound);
        }
        self.inner.list(cancel).await
    }
}
