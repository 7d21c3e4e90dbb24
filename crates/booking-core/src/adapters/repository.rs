//! Storage aggregate: order and room repositories plus the transaction seam.

use std::sync::Arc;

use booking_types::{CancelToken, Order, RoomAvailability};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::adapters::memory::MemoryStore;
use crate::adapters::transaction::Transaction;
use crate::error::StoreError;
use crate::ports::outbound::KeyedStore;

/// The system of record.
///
/// Orders are keyed by their `Uuid`, availability rows by their numeric
/// row id. Both sides sit behind [`KeyedStore`] so tests and future
/// backends can substitute either collection independently.
pub struct Storage {
    orders: Arc<dyn KeyedStore<Uuid, Order>>,
    rooms: Arc<dyn KeyedStore<u64, RoomAvailability>>,
}

impl Storage {
    /// Builds storage over caller-supplied repositories.
    pub fn new(
        orders: Arc<dyn KeyedStore<Uuid, Order>>,
        rooms: Arc<dyn KeyedStore<u64, RoomAvailability>>,
    ) -> Self {
        Self { orders, rooms }
    }

    /// Default wiring: both collections in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(MemoryStore::new()),
            rooms: Arc::new(MemoryStore::new()),
        }
    }

    /// Handle to the order repository.
    #[must_use]
    pub fn orders(&self) -> Arc<dyn KeyedStore<Uuid, Order>> {
        Arc::clone(&self.orders)
    }

    /// Handle to the room-availability repository.
    #[must_use]
    pub fn rooms(&self) -> Arc<dyn KeyedStore<u64, RoomAvailability>> {
        Arc::clone(&self.rooms)
    }

    /// Availability rows for one (hotel, room type) over the inclusive
    /// day range `[first_day, last_day]`.
    ///
    /// A filter over `list`, good enough for an in-memory backend. A real
    /// database would index this.
    pub async fn rooms_for_span(
        &self,
        cancel: &CancelToken,
        hotel_id: u64,
        room_type_id: u64,
        first_day: NaiveDate,
        last_day: NaiveDate,
    ) -> Result<Vec<RoomAvailability>, StoreError> {
        let rows = self.rooms.list(cancel).await?;
        Ok(rows
            .into_iter()
            .filter(|row| {
                row.hotel_id == hotel_id
                    && row.room_type_id == room_type_id
                    && row.day >= first_day
                    && row.day <= last_day
            })
            .collect())
    }

    /// Opens a compensating transaction scoped to this storage.
    pub fn begin_tx(&self, cancel: &CancelToken) -> Result<Transaction, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        Ok(Transaction::new())
    }
}
