//! Trait seams between the service layer and the outside world.

pub mod inbound;
pub mod outbound;
