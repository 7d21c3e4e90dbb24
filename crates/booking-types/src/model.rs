//! # Core Domain Entities
//!
//! The order record and the per-day room inventory row. Both are plain
//! data; repositories own the system of record and the saga owns the
//! working copies it mutates during one run.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::ReservationOrderEvent;

/// Lifecycle states of an [`Order`].
///
/// Transitions are monotonic within one saga run: an order starts `New`
/// and, after the booking stage, ends in exactly one of `Booked`,
/// `NoRooms`, or `FailedBook`. The payment states belong to a later stage
/// of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Accepted for processing, nothing reserved yet.
    New,
    /// The requested span could not be covered by inventory.
    NoRooms,
    /// Every night in the span was reserved.
    Booked,
    /// Payment completed (set by the payment stage, not the saga).
    Paid,
    /// A booking step failed and compensations fired.
    FailedBook,
    /// Payment failed (set by the payment stage, not the saga).
    FailedPay,
}

impl OrderStatus {
    /// Stable wire/log name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::NoRooms => "no_rooms",
            OrderStatus::Booked => "booked",
            OrderStatus::Paid => "paid",
            OrderStatus::FailedBook => "failed_book",
            OrderStatus::FailedPay => "failed_pay",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reservation order.
///
/// The stay interval is `[from, to)` by calendar day: a guest arriving
/// April 1 and leaving April 2 occupies one night, April 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Opaque unique identity, generated at ingress.
    pub id: Uuid,
    /// When the reservation request was accepted.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
    /// Target hotel.
    pub hotel_id: u64,
    /// Requested room category within the hotel.
    pub room_type_id: u64,
    /// Requester contact.
    pub user_email: String,
    /// Arrival instant; only its calendar day matters for inventory.
    pub from: DateTime<Utc>,
    /// Departure instant (exclusive by day).
    pub to: DateTime<Utc>,
    /// Current lifecycle state.
    pub status: OrderStatus,
}

impl From<ReservationOrderEvent> for Order {
    /// Materialize the order record for an incoming reservation event,
    /// starting in [`OrderStatus::New`]. Creation time travels with the
    /// event; `updated_at` is stamped here, at record time.
    fn from(event: ReservationOrderEvent) -> Self {
        Self {
            id: event.id,
            created_at: event.created_at,
            updated_at: Utc::now(),
            hotel_id: event.hotel_id,
            room_type_id: event.room_type_id,
            user_email: event.user_email,
            from: event.from,
            to: event.to,
            status: OrderStatus::New,
        }
    }
}

/// Remaining bookable units for one (hotel, room-type, day) tuple.
///
/// One record per tuple. The unsigned quota plus the saga's quota-zero
/// check keep the count from ever going negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomAvailability {
    /// Row identity.
    pub id: u64,
    /// Hotel the inventory belongs to.
    pub hotel_id: u64,
    /// Room category the inventory belongs to.
    pub room_type_id: u64,
    /// The calendar day this row covers.
    pub day: NaiveDate,
    /// Units still bookable for that day.
    pub quota: u32,
}
