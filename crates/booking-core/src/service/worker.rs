//! Event dispatch loop.

use std::sync::Arc;

use booking_types::{BookingEvent, CancelToken};
use topic_queue::{QueueError, Subscription};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::ports::inbound::EventHandler;

/// One dispatch loop over a queue subscription.
///
/// Several workers may subscribe to the same topic and compete for its
/// messages. Within one worker, events are handled strictly one at a
/// time; there is no partitioning across workers, so multi-worker runs
/// interleave processing of the stream.
pub struct Worker {
    id: Uuid,
    subscription: Subscription<BookingEvent>,
    handler: Arc<dyn EventHandler>,
}

impl Worker {
    #[must_use]
    pub fn new(subscription: Subscription<BookingEvent>, handler: Arc<dyn EventHandler>) -> Self {
        Self {
            id: Uuid::new_v4(),
            subscription,
            handler,
        }
    }

    /// Identity for log correlation.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Runs until cancellation fires or the subscription closes.
    ///
    /// An event in flight when the token fires is not guaranteed to
    /// finish; shutdown is prompt rather than draining.
    pub async fn run(self, cancel: CancelToken) {
        info!(worker = %self.id, topic = self.subscription.topic(), "Worker started");

        loop {
            match self.subscription.recv(&cancel).await {
                Ok(event) => self.dispatch(&cancel, event).await,
                Err(QueueError::Cancelled) => {
                    info!(worker = %self.id, "Worker stopped on cancellation");
                    return;
                }
                Err(QueueError::Closed) => {
                    info!(worker = %self.id, "Subscription closed, worker stopped");
                    return;
                }
                Err(err) => {
                    error!(worker = %self.id, error = %err, "Worker receive failed");
                    return;
                }
            }
        }
    }

    async fn dispatch(&self, cancel: &CancelToken, event: BookingEvent) {
        match event {
            BookingEvent::ReservationOrder(event) => {
                self.handler.handle_reservation_order(cancel, event).await;
            }
            BookingEvent::SuccessPayment(event) => {
                self.handler.handle_success_payment(cancel, event).await;
            }
            BookingEvent::FailedPayment(event) => {
                self.handler.handle_failed_payment(cancel, event).await;
            }
            other => {
                warn!(worker = %self.id, kind = other.kind(), "No handler for event kind, dropped");
            }
        }
    }
}
