//! Core domain entities for the transaction pool.
//!
//! Wraps the chain-wide [`Transaction`] with the metadata the pool tracks
//! and defines the classification that drives queue routing and expiry.

// Re-export from shared-types for convenience
pub use shared_types::{Account, PublicKey, Transaction, TransactionId, TransactionType};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp in milliseconds since UNIX epoch.
pub type Timestamp = u64;

/// Milliseconds between expiry sweeps.
pub const EXPIRY_INTERVAL_MS: u64 = 30_000;

/// Successful admissions between queue compactions.
pub const REINDEX_THRESHOLD: u64 = 1_000;

const SECS_PER_HOUR: u64 = 3_600;

/// Classification of a transaction, computed once on entry to the pool.
///
/// Anything but `Plain` routes to the multisignature queue; the class also
/// selects the time-to-live used by the expiry sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionClass {
    /// Registers a multisignature group; lives for the registration window
    /// its asset declares.
    MultisigRegistration,
    /// Carries a co-signature list (possibly still empty) and waits for the
    /// group to sign.
    SignatureBearing,
    /// Everything else.
    Plain,
}

impl TransactionClass {
    /// Classify by type tag first, then by signature-list presence.
    pub fn of(transaction: &Transaction) -> Self {
        if transaction.tx_type == TransactionType::MultisigRegistration {
            Self::MultisigRegistration
        } else if transaction.has_signature_list() {
            Self::SignatureBearing
        } else {
            Self::Plain
        }
    }

    /// Whether this class routes to the multisignature queue.
    pub fn is_multisignature(self) -> bool {
        !matches!(self, Self::Plain)
    }
}

/// The four staging queues of the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Verified and applied, awaiting block inclusion.
    Unconfirmed,
    /// Deferred to the next bundle tick for batched verification.
    Bundled,
    /// Verified, waiting for block-fill selection.
    Queued,
    /// Waiting for a signature group to complete.
    Multisignature,
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unconfirmed => "unconfirmed",
            Self::Bundled => "bundled",
            Self::Queued => "queued",
            Self::Multisignature => "multisignature",
        };
        f.write_str(name)
    }
}

/// A transaction in the pool with admission metadata.
#[derive(Clone, Debug)]
pub struct PooledTransaction {
    /// The transaction as admitted (mutated in place by normalization).
    pub transaction: Transaction,
    /// When the pool stamped the entry at enqueue time (ms).
    pub received_at: Timestamp,
    /// Classification, fixed at enqueue time.
    pub class: TransactionClass,
}

impl PooledTransaction {
    /// Wrap a transaction, stamping it with the enqueue timestamp.
    pub fn new(transaction: Transaction, received_at: Timestamp) -> Self {
        let class = TransactionClass::of(&transaction);
        Self {
            transaction,
            received_at,
            class,
        }
    }

    /// The wrapped transaction's identifier.
    pub fn id(&self) -> &TransactionId {
        &self.transaction.id
    }

    /// Seconds this entry may sit in the pool before the expiry sweep
    /// drops it.
    pub fn time_to_live_secs(&self, base_timeout_secs: u64) -> u64 {
        match self.class {
            TransactionClass::MultisigRegistration => {
                let hours = self
                    .transaction
                    .asset
                    .as_ref()
                    .map_or(0, |asset| u64::from(asset.lifetime));
                hours * SECS_PER_HOUR
            }
            TransactionClass::SignatureBearing => base_timeout_secs * 8,
            TransactionClass::Plain => base_timeout_secs,
        }
    }

    /// Whether the entry has outlived its time-to-live at `now`.
    pub fn is_expired(&self, now: Timestamp, base_timeout_secs: u64) -> bool {
        let age_ms = now.saturating_sub(self.received_at);
        age_ms > self.time_to_live_secs(base_timeout_secs) * 1_000
    }
}

/// Pool configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Milliseconds between bundle-drain ticks.
    pub broadcast_interval_ms: u64,
    /// Maximum bundled transactions drained per tick.
    pub release_limit: usize,
    /// Maximum live entries per queue.
    pub max_txs_per_queue: usize,
    /// Maximum transactions assembled for one block.
    pub max_txs_per_block: usize,
    /// Upper bound on merged listings shared with peers.
    pub max_shared_txs: usize,
    /// Base time-to-live, in seconds, for a pooled transaction.
    pub unconfirmed_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            broadcast_interval_ms: 5_000,
            release_limit: 25,
            max_txs_per_queue: 1_000,
            max_txs_per_block: 25,
            max_shared_txs: 100,
            unconfirmed_timeout_secs: 10_800, // 3 hours
        }
    }
}

impl PoolConfig {
    /// Creates a minimal config for testing.
    pub fn for_testing() -> Self {
        Self {
            broadcast_interval_ms: 50,
            max_txs_per_queue: 100,
            unconfirmed_timeout_secs: 60,
            ..Default::default()
        }
    }
}

/// Live-count snapshot of the pool's queues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Verified and applied entries awaiting block inclusion.
    pub unconfirmed: usize,
    /// Entries deferred to the next bundle tick.
    pub bundled: usize,
    /// Verified entries waiting for block-fill selection.
    pub queued: usize,
    /// Entries waiting for signature groups.
    pub multisignature: usize,
}

impl PoolStatus {
    /// Total live entries across all queues.
    pub fn total(&self) -> usize {
        self.unconfirmed + self.bundled + self.queued + self.multisignature
    }
}
