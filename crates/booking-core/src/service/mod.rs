//! The booking service: saga, dispatch workers, and read queries.

pub mod booking;
pub mod worker;
