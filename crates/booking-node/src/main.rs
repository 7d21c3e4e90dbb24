//! # Room-Booking Node
//!
//! The single-process deployment of the booking pipeline:
//!
//! ```text
//! POST /api/v1/order ──▶ topic queue ──▶ workers ──▶ booking saga
//!                          │                             │
//!                          └── payment.requested ◀───────┘ (booked only)
//! ```
//!
//! ## Startup sequence
//!
//! 1. Load configuration (defaults, then environment overrides)
//! 2. Create the queue and every pipeline topic
//! 3. Seed the in-memory inventory
//! 4. Start the booking workers
//! 5. Serve the HTTP API until Ctrl+C
//!
//! Shutdown closes the queue first so draining workers observe closed
//! topics, then cancels so blocked ones wake up, then joins the workers
//! under the grace period.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use booking_core::{BookingService, Storage};
use booking_node::config::NodeConfig;
use booking_node::http::{self, AppState};
use booking_node::seed;
use booking_types::{topics, BookingEvent, CancelSource};
use topic_queue::{ChannelQueue, Queue};

/// Load configuration from defaults and environment.
fn load_config() -> NodeConfig {
    let mut config = NodeConfig::default();

    if let Ok(addr) = std::env::var("BOOKING_HTTP_ADDR") {
        config.http.listen_addr = addr;
    }
    if let Ok(capacity) = std::env::var("BOOKING_QUEUE_CAPACITY") {
        if let Ok(parsed) = capacity.parse() {
            config.queue.capacity = parsed;
        }
    }
    if let Ok(workers) = std::env::var("BOOKING_WORKER_COUNT") {
        if let Ok(parsed) = workers.parse() {
            config.booking.worker_count = parsed;
        }
    }

    config
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for the shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config();
    info!(
        addr = %config.http.listen_addr,
        workers = config.booking.worker_count,
        capacity = config.queue.capacity,
        "Booking node starting"
    );

    let source = CancelSource::new();
    let cancel = source.token();

    let queue = Arc::new(ChannelQueue::new(config.queue).context("Failed to create the queue")?);
    for topic in topics::ALL {
        queue
            .create_topic(&cancel, topic)
            .await
            .with_context(|| format!("Failed to create topic {topic}"))?;
    }
    info!(topics = topics::ALL.len(), "Queue ready");

    let storage = Arc::new(Storage::in_memory());
    let rows = seed::apply(&cancel, &storage)
        .await
        .context("Failed to seed the inventory")?;
    info!(rows, "Inventory seeded");

    let service = Arc::new(BookingService::new(
        config.booking,
        Arc::clone(&queue) as Arc<dyn Queue<BookingEvent>>,
        Arc::clone(&storage),
    )?);
    let workers = Arc::clone(&service)
        .run(&cancel)
        .await
        .context("Failed to start the booking workers")?;

    let state = AppState::new(
        service,
        Arc::clone(&queue) as Arc<dyn Queue<BookingEvent>>,
        cancel.clone(),
    );
    let listener = TcpListener::bind(&config.http.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.http.listen_addr))?;
    info!(addr = %config.http.listen_addr, "HTTP server listening");

    axum::serve(listener, http::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shutting down");
    if let Err(err) = queue.close(&cancel).await {
        warn!(error = %err, "Queue close failed");
    }
    source.cancel();

    let grace = Duration::from_secs(config.http.shutdown_grace_secs);
    for worker in workers {
        match timeout(grace, worker).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "Worker ended with a panic"),
            Err(_) => warn!("Worker did not stop within the grace period"),
        }
    }
    info!("Booking node stopped");
    Ok(())
}
