//! In-memory keyed store.
//!
//! Backs every collection in the default wiring. A `parking_lot::RwLock`
//! around a `HashMap` is enough because no lock is ever held across an
//! await point.

use std::collections::HashMap;
use std::hash::Hash;

use async_trait::async_trait;
use booking_types::CancelToken;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::ports::outbound::KeyedStore;

/// Process-local [`KeyedStore`] over a hash map.
///
/// Values are stored and returned by clone, so callers never observe a
/// partially written record.
pub struct MemoryStore<K, V> {
    records: RwLock<HashMap<K, V>>,
}

impl<K, V> MemoryStore<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl<K, V> Default for MemoryStore<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> KeyedStore<K, V> for MemoryStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn create(&self, cancel: &CancelToken, key: K, value: V) -> Result<(), StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let mut records = self.records.write();
        if records.contains_key(&key) {
            return Err(StoreError::DuplicateConstraint);
        }
        records.insert(key, value);
        Ok(())
    }

    async fn read(&self, cancel: &CancelToken, key: &K) -> Result<V, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        self.records.read().get(key).cloned().ok_or(StoreError::NotFound)
    }

    async fn update(&self, cancel: &CancelToken, key: &K, value: V) -> Result<(), StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let mut records = self.records.write();
        match records.get_mut(key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, cancel: &CancelToken, key: &K) -> Result<(), StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        self.records
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, cancel: &CancelToken) -> Result<Vec<V>, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        Ok(self.records.read().values().cloned().collect())
    }
}
