//! # Shared Bus - Event Bus for Inter-Subsystem Communication
//!
//! In-process publish/subscribe channel connecting the node's subsystems.
//! The transaction pool announces successfully verified transactions here;
//! the peer broadcaster and other interested subsystems subscribe and react.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Transaction  │                    │   Peer       │
//! │ Pool         │    publish()       │   Broadcast  │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! Built on `tokio::sync::broadcast`: publishing never blocks, slow
//! subscribers lag and drop rather than back up the publisher.

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, PoolEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events buffered per subscriber before older events are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
