//! # Pipeline Flow Tests
//!
//! Drive the pipeline the way the deployed node does: a reservation event
//! is published on the queue, a worker picks it up, the saga books or
//! rejects, and the outcome lands in storage plus (for bookings) on the
//! payment topic. The HTTP flow test goes one layer further out and
//! enters through the router.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use tokio::task::JoinHandle;
    use tokio::time::timeout;
    use tower::ServiceExt;
    use uuid::Uuid;

    use booking_core::{BookingConfig, BookingService, Storage};
    use booking_node::http::{self, AppState};
    use booking_node::seed;
    use booking_types::{
        topics, BookingEvent, CancelSource, CancelToken, OrderStatus, ReservationOrderEvent,
        RoomAvailability,
    };
    use topic_queue::{ChannelQueue, Queue, QueueConfig, Subscription};

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, day, 14, 0, 0).unwrap()
    }

    fn room_row(id: u64, day: u32, quota: u32) -> RoomAvailability {
        RoomAvailability {
            id,
            hotel_id: 1,
            room_type_id: 1,
            day: date(day),
            quota,
        }
    }

    /// Hotel 1, room type 1, April 1-7, ten units per day.
    fn april_inventory() -> Vec<RoomAvailability> {
        (1..=7).map(|day| room_row(u64::from(day), day, 10)).collect()
    }

    fn reservation(from_day: u32, to_day: u32) -> ReservationOrderEvent {
        ReservationOrderEvent {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            hotel_id: 1,
            room_type_id: 1,
            user_email: "guest@example.com".to_string(),
            from: at(from_day),
            to: at(to_day),
        }
    }

    /// A running pipeline: queue, storage, and spawned workers.
    struct Pipeline {
        queue: Arc<ChannelQueue<BookingEvent>>,
        storage: Arc<Storage>,
        payments: Subscription<BookingEvent>,
        workers: Vec<JoinHandle<()>>,
        source: CancelSource,
    }

    impl Pipeline {
        fn cancel(&self) -> CancelToken {
            self.source.token()
        }

        async fn submit(&self, event: ReservationOrderEvent) {
            self.queue
                .publish(
                    &self.cancel(),
                    topics::RESERVED_ORDER_REQUEST,
                    BookingEvent::ReservationOrder(event),
                )
                .await
                .unwrap();
        }

        /// Poll storage until the order leaves `new`.
        async fn await_terminal(&self, order_id: Uuid) -> OrderStatus {
            let cancel = self.cancel();
            for _ in 0..400 {
                if let Ok(order) = self.storage.orders().read(&cancel, &order_id).await {
                    if order.status != OrderStatus::New {
                        return order.status;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            panic!("order {order_id} never reached a terminal status");
        }

        async fn quota_of(&self, row_id: u64) -> u32 {
            self.storage
                .rooms()
                .read(&self.cancel(), &row_id)
                .await
                .unwrap()
                .quota
        }

        /// Count payment requests until the topic stays quiet.
        async fn drain_payments(&self) -> usize {
            let cancel = self.cancel();
            let mut count = 0;
            while let Ok(received) =
                timeout(Duration::from_millis(200), self.payments.recv(&cancel)).await
            {
                let event = received.unwrap();
                assert!(matches!(event, BookingEvent::PaymentRequested(_)));
                count += 1;
            }
            count
        }

        async fn stop(self) {
            self.source.cancel();
            for worker in self.workers {
                timeout(Duration::from_millis(500), worker)
                    .await
                    .expect("worker should stop on cancellation")
                    .unwrap();
            }
        }
    }

    async fn pipeline(worker_count: usize, rows: Vec<RoomAvailability>) -> Pipeline {
        let source = CancelSource::new();
        let cancel = source.token();

        let queue = Arc::new(ChannelQueue::new(QueueConfig { capacity: 32 }).unwrap());
        for topic in topics::ALL {
            queue.create_topic(&cancel, topic).await.unwrap();
        }
        let payments = queue
            .subscribe(&cancel, topics::PAYMENT_REQUEST)
            .await
            .unwrap();

        let storage = Arc::new(Storage::in_memory());
        for row in rows {
            storage.rooms().create(&cancel, row.id, row).await.unwrap();
        }

        let service = Arc::new(
            BookingService::new(
                BookingConfig { worker_count },
                Arc::clone(&queue) as Arc<dyn Queue<BookingEvent>>,
                Arc::clone(&storage),
            )
            .unwrap(),
        );
        let workers = Arc::clone(&service).run(&cancel).await.unwrap();

        Pipeline {
            queue,
            storage,
            payments,
            workers,
            source,
        }
    }

    // =========================================================================
    // EVENT-DRIVEN FLOWS
    // =========================================================================

    /// A covered two-night stay ends `booked`, decrements each night, and
    /// produces exactly one payment request.
    #[tokio::test]
    async fn test_reservation_event_books_span_and_requests_payment() {
        let pipeline = pipeline(1, april_inventory()).await;
        let event = reservation(1, 3);
        let order_id = event.id;

        pipeline.submit(event).await;
        assert_eq!(pipeline.await_terminal(order_id).await, OrderStatus::Booked);

        assert_eq!(pipeline.quota_of(1).await, 9);
        assert_eq!(pipeline.quota_of(2).await, 9);
        assert_eq!(pipeline.quota_of(3).await, 10);

        let payment = timeout(
            Duration::from_millis(500),
            pipeline.payments.recv(&pipeline.cancel()),
        )
        .await
        .expect("payment request should arrive")
        .unwrap();
        match payment {
            BookingEvent::PaymentRequested(request) => {
                assert_eq!(request.order_id, order_id);
                assert!(!request.is_paid);
            }
            other => panic!("expected a payment request, got {other:?}"),
        }

        pipeline.stop().await;
    }

    /// One exhausted night rejects the whole span and leaves every other
    /// night's quota untouched.
    #[tokio::test]
    async fn test_exhausted_day_blocks_without_quota_loss() {
        let rows = vec![room_row(1, 1, 10), room_row(2, 2, 0), room_row(3, 3, 10)];
        let pipeline = pipeline(1, rows).await;
        let event = reservation(1, 4);
        let order_id = event.id;

        pipeline.submit(event).await;
        assert_eq!(pipeline.await_terminal(order_id).await, OrderStatus::NoRooms);

        assert_eq!(pipeline.quota_of(1).await, 10);
        assert_eq!(pipeline.quota_of(2).await, 0);
        assert_eq!(pipeline.quota_of(3).await, 10);
        assert_eq!(pipeline.drain_payments().await, 0);

        pipeline.stop().await;
    }

    /// A span with a missing inventory day cannot be booked.
    #[tokio::test]
    async fn test_uncovered_span_is_no_rooms() {
        let rows = vec![room_row(1, 1, 10), room_row(3, 3, 10)];
        let pipeline = pipeline(1, rows).await;
        let event = reservation(1, 4);
        let order_id = event.id;

        pipeline.submit(event).await;
        assert_eq!(pipeline.await_terminal(order_id).await, OrderStatus::NoRooms);
        assert_eq!(pipeline.drain_payments().await, 0);

        pipeline.stop().await;
    }

    /// Twelve single-night requests against ten units: exactly ten book,
    /// the remainder get `no_rooms`, and quota lands on zero.
    #[tokio::test]
    async fn test_oversubscription_books_exactly_the_quota() {
        let pipeline = pipeline(1, vec![room_row(1, 1, 10)]).await;

        let mut order_ids = Vec::new();
        for _ in 0..12 {
            let event = reservation(1, 2);
            order_ids.push(event.id);
            pipeline.submit(event).await;
        }

        let mut booked = 0;
        let mut rejected = 0;
        for order_id in order_ids {
            match pipeline.await_terminal(order_id).await {
                OrderStatus::Booked => booked += 1,
                OrderStatus::NoRooms => rejected += 1,
                other => panic!("unexpected terminal status {other:?}"),
            }
        }

        assert_eq!(booked, 10);
        assert_eq!(rejected, 2);
        assert_eq!(pipeline.quota_of(1).await, 0);
        assert_eq!(pipeline.drain_payments().await, 10);

        pipeline.stop().await;
    }

    // =========================================================================
    // HTTP INGRESS FLOW
    // =========================================================================

    /// Entering through the router: POST an order, poll it to `booked`,
    /// and watch the inventory endpoint reflect the two booked nights.
    #[tokio::test]
    async fn test_http_ingress_drives_the_full_pipeline() {
        let source = CancelSource::new();
        let cancel = source.token();

        let queue = Arc::new(ChannelQueue::new(QueueConfig::default()).unwrap());
        for topic in topics::ALL {
            queue.create_topic(&cancel, topic).await.unwrap();
        }
        let storage = Arc::new(Storage::in_memory());
        seed::apply(&cancel, &storage).await.unwrap();

        let service = Arc::new(
            BookingService::new(
                BookingConfig::default(),
                Arc::clone(&queue) as Arc<dyn Queue<BookingEvent>>,
                Arc::clone(&storage),
            )
            .unwrap(),
        );
        let workers = Arc::clone(&service).run(&cancel).await.unwrap();
        let router = http::router(AppState::new(
            service,
            Arc::clone(&queue) as Arc<dyn Queue<BookingEvent>>,
            cancel.clone(),
        ));

        let body = serde_json::json!({
            "hotel_id": 1,
            "room_type_id": 1,
            "email": "guest@example.com",
            "from": "2024-04-01T14:00:00Z",
            "to": "2024-04-03T10:00:00Z",
        })
        .to_string();
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/order")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created: serde_json::Value =
            serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap())
                .unwrap();
        assert_eq!(created["status"], "received");
        let order_id = created["order_id"].as_str().unwrap().to_string();

        // Poll the read endpoint until the saga settles.
        let mut last_status = String::new();
        for _ in 0..400 {
            let response = router
                .clone()
                .oneshot(
                    Request::builder()
                        .uri(format!("/api/v1/order/{order_id}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            if response.status() == StatusCode::OK {
                let order: serde_json::Value = serde_json::from_slice(
                    &to_bytes(response.into_body(), usize::MAX).await.unwrap(),
                )
                .unwrap();
                last_status = order["status"].as_str().unwrap_or_default().to_string();
                if last_status != "new" {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(last_status, "booked");

        // Two nights were taken from hotel 1, room type 1.
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/room/1/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let rooms: serde_json::Value =
            serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap())
                .unwrap();
        let rooms = rooms.as_array().unwrap();
        assert_eq!(rooms.len(), 7);
        let decremented = rooms.iter().filter(|row| row["quota"] == 9).count();
        assert_eq!(decremented, 2);

        source.cancel();
        for worker in workers {
            timeout(Duration::from_millis(500), worker)
                .await
                .expect("worker should stop on cancellation")
                .unwrap();
        }
    }
}
