//! # Bus Events
//!
//! Defines the event types that flow through the shared bus, with the
//! topic/filter machinery subscribers use to select what they receive.

use serde::{Deserialize, Serialize};
use shared_types::{Transaction, TransactionId};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PoolEvent {
    /// A transaction passed verification and entered the pool's staging
    /// queues. Published at most once per successful verification.
    ///
    /// `broadcast` tells the peer layer whether the transaction should be
    /// relayed onward or was already received from the network.
    UnconfirmedTransaction {
        /// The verified transaction.
        transaction: Transaction,
        /// Whether subscribers should forward it to peers.
        broadcast: bool,
    },
}

impl PoolEvent {
    /// Topic of this event, for subscription filtering.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::UnconfirmedTransaction { .. } => EventTopic::TransactionPool,
        }
    }

    /// Identifier of the transaction the event concerns.
    #[must_use]
    pub fn transaction_id(&self) -> &TransactionId {
        match self {
            Self::UnconfirmedTransaction { transaction, .. } => &transaction.id,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Transaction pool events.
    TransactionPool,
    /// All events, no filtering.
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// A filter that accepts every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &PoolEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
