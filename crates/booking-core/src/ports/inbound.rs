//! Inbound (driving) port for the booking pipeline.
//!
//! Workers pull [`BookingEvent`]s off the queue and hand them to an
//! [`EventHandler`]. [`BookingService`](crate::service::booking::BookingService)
//! is the production implementation.
//!
//! [`BookingEvent`]: booking_types::BookingEvent

use async_trait::async_trait;
use booking_types::{CancelToken, FailedPaymentEvent, ReservationOrderEvent, SuccessPaymentEvent};

/// Per-kind event processing.
///
/// Handlers are best-effort: failures are logged inside the handler and
/// never bubble up to the dispatch loop, so one bad event cannot stall
/// the worker.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Runs the booking saga for a freshly submitted order.
    async fn handle_reservation_order(&self, cancel: &CancelToken, event: ReservationOrderEvent);

    /// Reacts to a payment that went through.
    async fn handle_success_payment(&self, cancel: &CancelToken, event: SuccessPaymentEvent);

    /// Reacts to a payment that was declined.
    async fn handle_failed_payment(&self, cancel: &CancelToken, event: FailedPaymentEvent);
}
