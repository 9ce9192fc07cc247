//! Domain layer of the transaction pool.
//!
//! Pure in-memory state and rules: the staging queues with their indices,
//! transaction classification, configuration, and the pool's error type.

pub mod entities;
pub mod errors;
pub mod queue;
pub mod store;

pub use entities::{
    Account, PoolConfig, PoolStatus, PooledTransaction, PublicKey, QueueKind, Timestamp,
    Transaction, TransactionClass, TransactionId, EXPIRY_INTERVAL_MS, REINDEX_THRESHOLD,
};
pub use errors::PoolError;
pub use queue::TransactionQueue;
pub use store::QueueStore;
