//! # Resilience Tests
//!
//! Shutdown and contention behavior: workers must stop promptly on
//! cancellation or queue closure, finished work must survive shutdown,
//! and concurrent submissions must leave storage and the payment topic
//! consistent with each other.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rand::Rng;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;
    use uuid::Uuid;

    use booking_core::{BookingConfig, BookingService, Storage};
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

        async fn drain_payments(&self) -> usize {
            let cancel = self.cancel();
            let mut count = 0;
            while let Ok(received) =
                timeout(Duration::from_millis(200), self.payments.recv(&cancel)).await
            {
                received.unwrap();
                count += 1;
            }
            count
        }

        /// Join every worker without cancelling first.
        async fn join_workers(self) {
            for worker in self.workers {
                timeout(Duration::from_millis(500), worker)
                    .await
                    .expect("worker should stop")
                    .unwrap();
            }
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
    // SHUTDOWN
    // =========================================================================

    /// Cancelling the source unblocks idle workers immediately.
    #[tokio::test]
    async fn test_cancellation_stops_idle_workers() {
        let pipeline = pipeline(2, Vec::new()).await;
        pipeline.stop().await;
    }

    /// Closing the queue drains subscriptions and ends the workers even
    /// while the cancellation token stays live.
    #[tokio::test]
    async fn test_queue_close_stops_workers() {
        let pipeline = pipeline(1, Vec::new()).await;
        pipeline.queue.close(&pipeline.cancel()).await.unwrap();
        pipeline.join_workers().await;
    }

    /// Orders settled before shutdown keep their stored outcome after it.
    #[tokio::test]
    async fn test_completed_work_survives_shutdown() {
        let pipeline = pipeline(1, vec![room_row(1, 1, 10)]).await;
        let event = reservation(1, 2);
        let order_id = event.id;

        pipeline.submit(event).await;
        assert_eq!(pipeline.await_terminal(order_id).await, OrderStatus::Booked);

        let storage = Arc::clone(&pipeline.storage);
        pipeline.stop().await;

        // Cancellation gates calls, not the data behind them.
        let fresh = CancelSource::new();
        let cancel = fresh.token();
        let order = storage.orders().read(&cancel, &order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Booked);
        let row = storage.rooms().read(&cancel, &1).await.unwrap();
        assert_eq!(row.quota, 9);
    }

    // =========================================================================
    // CONTENTION
    // =========================================================================

    /// Twenty interleaved submissions across three workers: every order
    /// reaches a terminal status and the payment topic carries exactly
    /// one request per booked order.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_submissions_settle_every_order() {
        let pipeline = pipeline(3, april_inventory()).await;

        let events: Vec<ReservationOrderEvent> = {
            let mut rng = rand::thread_rng();
            (0..20)
                .map(|_| {
                    let day = rng.gen_range(1..=6);
                    reservation(day, day + 1)
                })
                .collect()
        };
        let order_ids: Vec<Uuid> = events.iter().map(|event| event.id).collect();

        let mut publishers = Vec::new();
        for event in events {
            let queue = Arc::clone(&pipeline.queue);
            let cancel = pipeline.cancel();
            publishers.push(tokio::spawn(async move {
                let jitter = u64::from(rand::random::<u8>() % 5);
                tokio::time::sleep(Duration::from_millis(jitter)).await;
                queue
                    .publish(
                        &cancel,
                        topics::RESERVED_ORDER_REQUEST,
                        BookingEvent::ReservationOrder(event),
                    )
                    .await
                    .unwrap();
            }));
        }
        for publisher in publishers {
            publisher.await.unwrap();
        }

        let mut booked = 0;
        for order_id in order_ids {
            match pipeline.await_terminal(order_id).await {
                OrderStatus::Booked => booked += 1,
                OrderStatus::NoRooms => {}
                other => panic!("unexpected terminal status {other:?}"),
            }
        }
        assert!(booked > 0, "some submissions should have booked");
        assert_eq!(pipeline.drain_payments().await, booked);

        pipeline.stop().await;
    }
}
