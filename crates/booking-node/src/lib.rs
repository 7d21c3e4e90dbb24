//! # Booking Node Library
//!
//! Exposes the node's internal modules so the HTTP handlers and seed
//! data can be exercised from tests. The entry point is the
//! `booking-node` binary in `main.rs`.

pub mod config;
pub mod http;
pub mod seed;
