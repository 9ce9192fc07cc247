//! Event publication adapter for the transaction pool.
//!
//! The pool announces each successfully verified transaction at most once;
//! subscribers relay it to peers when the broadcast flag is set.

use async_trait::async_trait;
use shared_bus::{EventPublisher, InMemoryEventBus, PoolEvent};
use shared_types::Transaction;
use std::sync::Arc;
use tracing::debug;

/// Outbound event port of the pool.
#[async_trait]
pub trait PoolEventPublisher: Send + Sync {
    /// Announce a verified transaction, with the relay flag for peers.
    async fn unconfirmed_transaction(&self, transaction: Transaction, broadcast: bool);
}

/// Publisher backed by the shared event bus.
pub struct BusPublisher {
    bus: Arc<InMemoryEventBus>,
}

impl BusPublisher {
    /// Wrap a bus handle.
    pub fn new(bus: Arc<InMemoryEventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl PoolEventPublisher for BusPublisher {
    async fn unconfirmed_transaction(&self, transaction: Transaction, broadcast: bool) {
        let id = transaction.id.clone();
        let receivers = self
            .bus
            .publish(PoolEvent::UnconfirmedTransaction {
                transaction,
                broadcast,
            })
            .await;
        debug!(id = %id, broadcast, receivers, "Announced unconfirmed transaction");
    }
}

/// No-op publisher for wiring the pool without an event bus.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPublisher;

#[async_trait]
impl PoolEventPublisher for NoOpPublisher {
    async fn unconfirmed_transaction(&self, _transaction: Transaction, _broadcast: bool) {}
}

/// Recording publisher for tests.
#[cfg(test)]
pub struct RecordingPublisher {
    /// (id, broadcast) pairs in announcement order.
    pub announced: std::sync::Mutex<Vec<(shared_types::TransactionId, bool)>>,
}

#[cfg(test)]
impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            announced: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl PoolEventPublisher for RecordingPublisher {
    async fn unconfirmed_transaction(&self, transaction: Transaction, broadcast: bool) {
        self.announced
            .lock()
            .unwrap()
            .push((transaction.id, broadcast));
    }
}
