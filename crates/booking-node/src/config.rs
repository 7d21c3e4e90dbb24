//! # Node Configuration
//!
//! Unified configuration for the node process. The queue and booking
//! sections reuse the library config types, so their validation happens
//! where the values are consumed: the queue constructor and the booking
//! service constructor.

use booking_core::BookingConfig;
use topic_queue::QueueConfig;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// HTTP server configuration.
    pub http: HttpConfig,
    /// Topic queue configuration.
    pub queue: QueueConfig,
    /// Booking service configuration.
    pub booking: BookingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Listen address for the API server.
    pub listen_addr: String,
    /// Seconds granted to workers and the server to stop on shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            shutdown_grace_secs: 5,
        }
    }
}
