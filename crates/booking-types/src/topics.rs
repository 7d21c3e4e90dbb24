//! Topic names used across the pipeline.
//!
//! Only the reserved-order and payment-request lanes are actively produced
//! and consumed today; the rest are created at startup so later pipeline
//! stages have named lanes waiting for them.

// Success flow.
pub const RESERVED_ORDER_REQUEST: &str = "order.reservation_requested";
pub const PAYMENT_REQUEST: &str = "payment.requested";
pub const NOTIFICATION_REQUEST: &str = "notification.requested";
pub const SUCCESS_PAYMENT_PROCESS: &str = "payment.process_succeeded";

// Error flow.
pub const FAILED_ORDER: &str = "order.failed";
pub const FAILED_PAYMENT: &str = "payment.failed";
pub const FAILED_PAYMENT_PROCESS: &str = "payment.process_failed";

/// Every topic the node creates at startup.
pub const ALL: [&str; 7] = [
    RESERVED_ORDER_REQUEST,
    FAILED_ORDER,
    PAYMENT_REQUEST,
    FAILED_PAYMENT,
    NOTIFICATION_REQUEST,
    FAILED_PAYMENT_PROCESS,
    SUCCESS_PAYMENT_PROCESS,
];
