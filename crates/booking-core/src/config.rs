//! Booking service configuration and validation.

use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// At least one worker is needed to drain the reservation topic.
    #[error("Worker count must be non-zero")]
    ZeroWorkers,
}

/// Tunables for [`crate::BookingService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingConfig {
    /// Number of workers competing on the reservation topic. More than
    /// one interleaves processing of the event stream; there is no
    /// partitioning.
    pub worker_count: usize,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self { worker_count: 1 }
    }
}

impl BookingConfig {
    /// Create a configuration with validation.
    pub fn new(worker_count: usize) -> Result<Self, ConfigError> {
        let config = Self { worker_count };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}
