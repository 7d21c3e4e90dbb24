//! # HTTP API
//!
//! REST ingress and read surface for the pipeline:
//!
//! | Route                                    | Purpose                          |
//! |------------------------------------------|----------------------------------|
//! | `GET /api/v1/ping`                       | Liveness probe                   |
//! | `POST /api/v1/order`                     | Submit a reservation request     |
//! | `GET /api/v1/order/:id`                  | Read one order                   |
//! | `GET /api/v1/order`                      | List all orders (debug)          |
//! | `GET /api/v1/room`                       | List all availability (debug)    |
//! | `GET /api/v1/room/:hotel_id/:room_type_id` | Filtered availability, 0 = any |
//!
//! Submission is fire-and-forget: the handler validates, publishes the
//! reservation event, and answers `received` before any booking work
//! happens. Clients poll the order endpoint for the outcome.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use booking_core::{BookingService, StoreError};
use booking_types::{topics, BookingEvent, CancelToken, Order, ReservationOrderEvent};
use topic_queue::Queue;

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    service: Arc<BookingService>,
    queue: Arc<dyn Queue<BookingEvent>>,
    cancel: CancelToken,
}

impl AppState {
    #[must_use]
    pub fn new(
        service: Arc<BookingService>,
        queue: Arc<dyn Queue<BookingEvent>>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            service,
            queue,
            cancel,
        }
    }
}

/// Build the API router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/ping", get(ping))
        .route("/api/v1/order", post(create_order).get(list_orders))
        .route("/api/v1/order/:id", get(get_order))
        .route("/api/v1/room", get(list_rooms))
        .route("/api/v1/room/:hotel_id/:room_type_id", get(rooms_filtered))
        .with_state(state)
}

/// Body of `POST /api/v1/order`.
#[derive(Debug, Deserialize)]
struct ReservationRequest {
    hotel_id: u64,
    room_type_id: u64,
    email: String,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

/// Wire shape of one order.
#[derive(Debug, Serialize)]
struct OrderResponse {
    id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    status: String,
    hotel_id: u64,
    room_type_id: u64,
    email: String,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            created_at: order.created_at,
            updated_at: order.updated_at,
            status: order.status.as_str().to_string(),
            hotel_id: order.hotel_id,
            room_type_id: order.room_type_id,
            email: order.user_email,
            from: order.from,
            to: order.to,
        }
    }
}

/// Structural email check: exactly one `@`, non-empty on both sides,
/// no whitespace anywhere.
fn valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !email.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

fn bad_request(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
}

async fn ping() -> &'static str {
    "pong"
}

async fn create_order(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let request: ReservationRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(err) => {
            error!(error = %err, "Invalid reservation body");
            return bad_request("Invalid request body: please ensure JSON is properly formatted");
        }
    };

    if !valid_email(&request.email) {
        error!(email = %request.email, "Invalid email format");
        return bad_request("Invalid email format: please provide a valid email");
    }
    if request.hotel_id == 0 || request.room_type_id == 0 {
        error!("Invalid hotel or room type ID");
        return bad_request("Invalid hotel or room type ID: IDs must be positive integers");
    }
    if request.from >= request.to {
        error!("From date must be before To date");
        return bad_request("From date must be before To date");
    }

    let now = Utc::now();
    let event = ReservationOrderEvent {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        hotel_id: request.hotel_id,
        room_type_id: request.room_type_id,
        user_email: request.email,
        from: request.from,
        to: request.to,
    };
    let order_id = event.id;

    // Blocking publish so ingress applies backpressure on a full topic.
    if let Err(err) = state
        .queue
        .publish(
            &state.cancel,
            topics::RESERVED_ORDER_REQUEST,
            BookingEvent::ReservationOrder(event),
        )
        .await
    {
        error!(error = %err, "Failed to publish the order request");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Failed to publish the order request" })),
        );
    }

    info!(order_id = %order_id, "Reservation request accepted");
    (
        StatusCode::OK,
        Json(serde_json::json!({ "order_id": order_id, "status": "received" })),
    )
}

async fn get_order(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let order_id = match Uuid::parse_str(&id) {
        Ok(order_id) => order_id,
        Err(_) => return bad_request("Invalid order ID format"),
    };

    match state.service.order(&state.cancel, order_id).await {
        Ok(order) => {
            let response = OrderResponse::from(order);
            (StatusCode::OK, Json(serde_json::json!(response)))
        }
        Err(StoreError::NotFound) => {
            info!(order_id = %order_id, "Order not found");
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "Order not found, it may still be processing" })),
            )
        }
        Err(err) => {
            error!(order_id = %order_id, error = %err, "Failed to retrieve order");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to retrieve order" })),
            )
        }
    }
}

// The listing endpoints below are a debug surface: they ignore store
// failures and answer with whatever was readable.

async fn list_orders(State(state): State<AppState>) -> impl IntoResponse {
    let orders = state.service.orders(&state.cancel).await.unwrap_or_default();
    Json(serde_json::json!(orders))
}

async fn list_rooms(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = state.service.rooms(&state.cancel).await.unwrap_or_default();
    Json(serde_json::json!(rooms))
}

async fn rooms_filtered(
    State(state): State<AppState>,
    Path((hotel_id, room_type_id)): Path<(String, String)>,
) -> impl IntoResponse {
    // Unparseable segments collapse to zero, the wildcard.
    let hotel_id: u64 = hotel_id.parse().unwrap_or(0);
    let room_type_id: u64 = room_type_id.parse().unwrap_or(0);

    let rooms = state.service.rooms(&state.cancel).await.unwrap_or_default();
    let rooms: Vec<_> = rooms
        .into_iter()
        .filter(|room| hotel_id == 0 || room.hotel_id == hotel_id)
        .filter(|room| room_type_id == 0 || room.room_type_id == room_type_id)
        .collect();
    Json(serde_json::json!(rooms))
}
