//! # Booking Saga
//!
//! One pass per reservation event, terminal on first pass, no retries:
//!
//! 1. **Record** the order (status `new`), best-effort.
//! 2. **Reserve**: fetch availability for every night of the stay.
//! 3. **Allocate**: register one quota decrement per night, or bail with
//!    `no_rooms` before registering anything.
//! 4. **Finalize**: register the order-status write, then commit.
//! 5. **Propagate**: publish a payment request when the pre-commit
//!    outcome is `booked`, even if the commit itself failed.
//!
//! Two gaps are deliberate and documented rather than fixed here: quota
//! races between concurrent runs on the same room-day (each run only
//! trusts its own commit/compensate), and a payment publish that fails
//! after a successful commit leaves the order `booked` with no payment
//! ever requested.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use booking_types::{
    calendar, topics, BookingEvent, CancelToken, FailedPaymentEvent, Order, OrderStatus,
    PaymentRequest, ReservationOrderEvent, RoomAvailability, SuccessPaymentEvent,
};
use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use topic_queue::{Queue, QueueError};
use tracing::{error, info};
use uuid::Uuid;

use crate::adapters::repository::Storage;
use crate::adapters::transaction::Transaction;
use crate::config::{BookingConfig, ConfigError};
use crate::error::StoreError;
use crate::ports::inbound::EventHandler;
use crate::service::worker::Worker;

/// The orchestration core of the pipeline.
///
/// Owns the saga logic and the read queries behind the HTTP surface;
/// implements [`EventHandler`] so workers can dispatch straight into it.
pub struct BookingService {
    config: BookingConfig,
    queue: Arc<dyn Queue<BookingEvent>>,
    storage: Arc<Storage>,
}

impl BookingService {
    /// Builds the service over its collaborators.
    pub fn new(
        config: BookingConfig,
        queue: Arc<dyn Queue<BookingEvent>>,
        storage: Arc<Storage>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            queue,
            storage,
        })
    }

    /// Spawns the dispatch workers and returns their join handles.
    ///
    /// Each worker takes its own subscription on the reserved-order
    /// topic. Subscriptions compete for messages, so more than one
    /// worker interleaves processing with no partitioning.
    pub async fn run(
        self: Arc<Self>,
        cancel: &CancelToken,
    ) -> Result<Vec<JoinHandle<()>>, QueueError> {
        let mut handles = Vec::with_capacity(self.config.worker_count);
        for _ in 0..self.config.worker_count {
            let subscription = self
                .queue
                .subscribe(cancel, topics::RESERVED_ORDER_REQUEST)
                .await?;
            let worker = Worker::new(subscription, Arc::clone(&self) as Arc<dyn EventHandler>);
            let token = cancel.clone();
            handles.push(tokio::spawn(async move { worker.run(token).await }));
        }
        info!(workers = self.config.worker_count, "Booking service started");
        Ok(handles)
    }

    /// Single order lookup.
    pub async fn order(&self, cancel: &CancelToken, id: Uuid) -> Result<Order, StoreError> {
        self.storage.orders().read(cancel, &id).await
    }

    /// Every stored order.
    pub async fn orders(&self, cancel: &CancelToken) -> Result<Vec<Order>, StoreError> {
        self.storage.orders().list(cancel).await
    }

    /// Every availability row.
    pub async fn rooms(&self, cancel: &CancelToken) -> Result<Vec<RoomAvailability>, StoreError> {
        self.storage.rooms().list(cancel).await
    }

    /// Reserve and allocate stages.
    ///
    /// Fetches the span's rows and registers one quota decrement per
    /// night. When the span cannot be covered, or any night is out of
    /// quota, nothing is registered and the working order keeps its
    /// unbookable status.
    async fn reserve_span(
        &self,
        cancel: &CancelToken,
        tx: &mut Transaction,
        order: &Order,
        working: &Arc<Mutex<Order>>,
    ) {
        let nights = calendar::nights(order.from, order.to);
        let (first, last) = match (nights.first(), nights.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                // Zero-length or inverted stay that slipped past ingress
                // validation: uncoverable, nothing to reserve.
                info!(order_id = %order.id, "Empty night span, nothing to reserve");
                return;
            }
        };

        let rows = match self
            .storage
            .rooms_for_span(cancel, order.hotel_id, order.room_type_id, first, last)
            .await
        {
            Ok(rows) => rows,
            Err(err) => {
                error!(order_id = %order.id, error = %err, "Failed to retrieve room availability");
                working.lock().status = OrderStatus::FailedBook;
                return;
            }
        };

        // One row per night; duplicate rows beyond the first are ignored.
        let mut by_day: HashMap<NaiveDate, RoomAvailability> = HashMap::new();
        for row in rows {
            by_day.entry(row.day).or_insert(row);
        }
        let night_rows: Vec<RoomAvailability> = nights
            .iter()
            .filter_map(|night| by_day.get(night).cloned())
            .collect();

        if night_rows.len() < nights.len() {
            info!(
                order_id = %order.id,
                nights = nights.len(),
                matched = night_rows.len(),
                "Span not fully covered by inventory"
            );
            return;
        }

        // Check the whole span before registering any step, so a commit
        // after an exhausted night cannot leak decrements for the nights
        // before it.
        if let Some(exhausted) = night_rows.iter().find(|row| row.quota == 0) {
            info!(
                order_id = %order.id,
                hotel_id = order.hotel_id,
                room_type_id = order.room_type_id,
                day = %exhausted.day,
                "No quota left for day, booking stopped"
            );
            return;
        }

        for row in night_rows {
            let restored = row.clone();
            let decremented = RoomAvailability {
                quota: row.quota - 1,
                ..row
            };

            let rooms = self.storage.rooms();
            let op_cancel = cancel.clone();
            let comp_rooms = self.storage.rooms();
            let comp_cancel = cancel.clone();
            let comp_working = Arc::clone(working);
            tx.execute(
                move || async move {
                    let id = decremented.id;
                    rooms.update(&op_cancel, &id, decremented).await?;
                    Ok(())
                },
                move || async move {
                    comp_working.lock().status = OrderStatus::FailedBook;
                    let id = restored.id;
                    comp_rooms.update(&comp_cancel, &id, restored).await?;
                    Ok(())
                },
            );
        }

        working.lock().status = OrderStatus::Booked;
    }

    /// Finalize stage: registers the order-status write, with a
    /// compensation reverting the stored order to its original snapshot.
    fn finalize(
        &self,
        cancel: &CancelToken,
        tx: &mut Transaction,
        order: &Order,
        working: &Arc<Mutex<Order>>,
    ) {
        let orders = self.storage.orders();
        let op_cancel = cancel.clone();
        let op_working = Arc::clone(working);
        let comp_orders = self.storage.orders();
        let comp_cancel = cancel.clone();
        let comp_working = Arc::clone(working);
        let original = order.clone();
        tx.execute(
            move || async move {
                // Status is read here, at commit time, not at registration.
                let updated = op_working.lock().clone();
                let id = updated.id;
                orders.update(&op_cancel, &id, updated).await?;
                Ok(())
            },
            move || async move {
                comp_working.lock().status = OrderStatus::FailedBook;
                let id = original.id;
                comp_orders.update(&comp_cancel, &id, original).await?;
                Ok(())
            },
        );
    }
}

#[async_trait]
impl EventHandler for BookingService {
    async fn handle_reservation_order(&self, cancel: &CancelToken, event: ReservationOrderEvent) {
        let order = Order::from(event);
        info!(
            order_id = %order.id,
            hotel_id = order.hotel_id,
            room_type_id = order.room_type_id,
            "Processing reservation order"
        );

        // The record stage is best-effort: a failed write is logged and
        // the booking attempt continues regardless.
        if let Err(err) = self
            .storage
            .orders()
            .create(cancel, order.id, order.clone())
            .await
        {
            error!(order_id = %order.id, error = %err, "Failed to store new order");
        }

        let mut tx = match self.storage.begin_tx(cancel) {
            Ok(tx) => tx,
            Err(err) => {
                error!(order_id = %order.id, error = %err, "Failed to begin transaction");
                return;
            }
        };

        // The working copy starts unbookable. Only a fully allocated span
        // upgrades it, and any compensation firing downgrades it again.
        let working = Arc::new(Mutex::new(Order {
            status: OrderStatus::NoRooms,
            ..order.clone()
        }));

        self.reserve_span(cancel, &mut tx, &order, &working).await;
        self.finalize(cancel, &mut tx, &order, &working);

        // Snapshot the outcome before commit: compensations downgrade the
        // working copy while unwinding, but propagation follows what
        // allocation decided even when persisting it only partially
        // succeeded.
        let intended = working.lock().status;

        if let Err(err) = tx.commit().await {
            error!(order_id = %order.id, error = %err, "Booking transaction failed");
        }

        info!(order_id = %order.id, status = %intended, "Reservation order processed");
        if intended != OrderStatus::Booked {
            return;
        }

        let payment = PaymentRequest::for_order(order.id);
        let payment_id = payment.id;
        match self
            .queue
            .async_publish(
                cancel,
                topics::PAYMENT_REQUEST,
                BookingEvent::PaymentRequested(payment),
            )
            .await
        {
            Ok(()) => {
                info!(order_id = %order.id, payment_id = %payment_id, "Payment request published");
            }
            Err(err) => {
                // The order stays booked with no payment ever requested;
                // there is no retry or alert path for this.
                error!(order_id = %order.id, error = %err, "Failed to publish payment request");
            }
        }
    }

    async fn handle_success_payment(&self, _cancel: &CancelToken, _event: SuccessPaymentEvent) {
        // Extension point for the payment stage.
        info!("Success payment handling is not implemented");
    }

    async fn handle_failed_payment(&self, _cancel: &CancelToken, _event: FailedPaymentEvent) {
        // Extension point for the payment stage.
        info!("Failed payment handling is not implemented");
    }
}
