//! Concrete implementations behind the outbound ports.

pub mod memory;
pub mod repository;
pub mod transaction;
