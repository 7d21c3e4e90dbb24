//! # Booking Types Crate
//!
//! Domain entities, pipeline events, topic names, calendar-day math, and
//! the cancellation token shared by every crate in the workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses a crate boundary
//!   lives here.
//! - **Closed event set**: all messages on the queue are variants of
//!   [`BookingEvent`]; consumers route with an exhaustive `match`, never
//!   by open-ended runtime type inspection.
//! - **Calendar days, not instants**: inventory is tracked per calendar
//!   day; stay intervals are half-open `[from, to)` by day, independent of
//!   time-of-day.

pub mod calendar;
pub mod cancel;
pub mod events;
pub mod model;
pub mod topics;

pub use cancel::{CancelSource, CancelToken};
pub use events::{
    BookingEvent, FailedPaymentEvent, PaymentRequest, ReservationOrderEvent, SuccessPaymentEvent,
};
pub use model::{Order, OrderStatus, RoomAvailability};
