//! Adapters layer of the transaction pool.
//!
//! Connects the pool's event port to the shared bus.

pub mod publisher;

pub use publisher::{BusPublisher, NoOpPublisher, PoolEventPublisher};
