//! # Booking Core
//!
//! The orchestration core of the room-booking pipeline: a reservation
//! event comes in from the topic queue, the saga records an order, tries
//! to reserve one room-unit for every night of the stay inside a
//! compensating transaction, and publishes a payment request exactly when
//! the span was fully allocated.
//!
//! ## Flow
//!
//! ```text
//! ReservationOrderEvent ──▶ Worker ──▶ BookingService (saga)
//!                                          │
//!                          ┌───────────────┼──────────────────┐
//!                          ▼               ▼                  ▼
//!                     order store     room store      payment topic
//!                    (record, final) (per-night -1)   (booked only)
//! ```
//!
//! ## Known limitations
//!
//! - Two concurrent saga runs can both observe quota 1 on the same
//!   room-day and both decrement; there is no per-row locking. The
//!   compensating transaction protects each run against its own
//!   failures, not against interleaving.
//! - A payment-request publish failure after a committed booking leaves
//!   the order `booked` with no payment ever requested. Logged, not
//!   retried.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod config;
pub mod error;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::memory::MemoryStore;
pub use adapters::repository::Storage;
pub use adapters::transaction::{CompensationFailure, Transaction, TxError};
pub use config::{BookingConfig, ConfigError};
pub use error::StoreError;
pub use ports::inbound::EventHandler;
pub use ports::outbound::KeyedStore;
pub use service::booking::BookingService;
pub use service::worker::Worker;
