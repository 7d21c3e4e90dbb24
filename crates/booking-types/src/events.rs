//! # Pipeline Events
//!
//! Every message that flows through the topic queue. All payloads are
//! immutable snapshots; the queue owns delivery, never content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client-submitted reservation intent, captured at ingress.
///
/// The sole input to the booking saga. Field-for-field a pre-status
/// [`crate::Order`]: the saga materializes the order record from this
/// snapshot and never reads the request again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationOrderEvent {
    /// Identity generated at ingress; becomes the order id.
    pub id: Uuid,
    /// When the request was accepted.
    pub created_at: DateTime<Utc>,
    /// Same as `created_at` at ingress.
    pub updated_at: DateTime<Utc>,
    /// Target hotel.
    pub hotel_id: u64,
    /// Requested room category.
    pub room_type_id: u64,
    /// Requester contact.
    pub user_email: String,
    /// Arrival instant.
    pub from: DateTime<Utc>,
    /// Departure instant (exclusive by calendar day).
    pub to: DateTime<Utc>,
}

/// Request for the payment stage to charge a booked order.
///
/// Produced exactly once per successfully booked order, never for
/// `no_rooms` or `failed_book` outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Payment identity.
    pub id: Uuid,
    /// The booked order this payment settles.
    pub order_id: Uuid,
    /// When the payment was requested.
    pub created_at: DateTime<Utc>,
    /// Set by the payment stage once settled; `None` until then.
    pub paid_at: Option<DateTime<Utc>>,
    /// Whether the payment has settled.
    pub is_paid: bool,
}

impl PaymentRequest {
    /// Build an unpaid request for `order_id`, timestamped now.
    #[must_use]
    pub fn for_order(order_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            created_at: Utc::now(),
            paid_at: None,
            is_paid: false,
        }
    }
}

/// Payment-settled notification. Payload not yet defined; the worker
/// routes it but handling is an extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessPaymentEvent {}

/// Payment-failed notification. Payload not yet defined; the worker
/// routes it but handling is an extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPaymentEvent {}

/// All events that can travel the topic queue.
///
/// A closed set: workers route with an exhaustive `match` per iteration,
/// and a variant arriving on a topic whose consumer does not handle it is
/// logged and dropped, never dynamically dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BookingEvent {
    /// A reservation request accepted at ingress.
    ReservationOrder(ReservationOrderEvent),
    /// A booked order awaiting payment.
    PaymentRequested(PaymentRequest),
    /// Payment settled (future pipeline stage).
    SuccessPayment(SuccessPaymentEvent),
    /// Payment failed (future pipeline stage).
    FailedPayment(FailedPaymentEvent),
}

impl BookingEvent {
    /// Short variant name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            BookingEvent::ReservationOrder(_) => "reservation_order",
            BookingEvent::PaymentRequested(_) => "payment_requested",
            BookingEvent::SuccessPayment(_) => "success_payment",
            BookingEvent::FailedPayment(_) => "failed_payment",
        }
    }
}
