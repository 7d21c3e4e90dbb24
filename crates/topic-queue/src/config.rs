//! Queue configuration and validation.

use serde::{Deserialize, Serialize};

use crate::error::QueueError;
use crate::DEFAULT_TOPIC_CAPACITY;

/// Tunables for a [`crate::ChannelQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Buffer capacity of each topic. Blocking publishers wait once a
    /// topic holds this many undelivered messages.
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_TOPIC_CAPACITY,
        }
    }
}

impl QueueConfig {
    /// Create a configuration with validation.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        let config = Self { capacity };
        config.validate()?;
        Ok(config)
    }

    /// A zero-capacity buffer could never deliver anything.
    pub fn validate(&self) -> Result<(), QueueError> {
        if self.capacity == 0 {
            return Err(QueueError::InvalidCapacity { capacity: 0 });
        }
        Ok(())
    }
}
