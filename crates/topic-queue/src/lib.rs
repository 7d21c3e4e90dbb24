//! # Topic Queue - Bounded In-Process Pub/Sub
//!
//! The only channel between pipeline stages: a registry of independently
//! buffered topics with blocking and non-blocking publish and competing
//! consumers on the subscription side.
//!
//! ## Shape
//!
//! ```text
//! ┌──────────────┐                      ┌──────────────┐
//! │ HTTP ingress │                      │    Worker    │
//! │              │  publish(topic, ev)  │              │
//! │              │ ───────┐             │              │
//! └──────────────┘        │             └──────────────┘
//!                         ▼                     ↑ recv()
//!                  ┌─────────────────────────────────┐
//!                  │          ChannelQueue           │
//!                  │  topic ──▶ bounded FIFO buffer  │
//!                  │  topic ──▶ bounded FIFO buffer  │
//!                  └─────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - **FIFO per topic** to the competing consumers; nothing across topics.
//! - **Bounded buffers**: blocking publish waits for space, non-blocking
//!   publish fails fast with a buffer-full error.
//! - **Prompt cancellation**: every operation takes a
//!   [`booking_types::CancelToken`] and fails with a distinguishable error
//!   once it fires, never silently succeeding.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod error;
pub mod queue;
pub mod subscription;

// Re-export main types
pub use config::QueueConfig;
pub use error::QueueError;
pub use queue::{ChannelQueue, Queue};
pub use subscription::Subscription;

/// Default per-topic buffer capacity before publishers block.
pub const DEFAULT_TOPIC_CAPACITY: usize = 10;
