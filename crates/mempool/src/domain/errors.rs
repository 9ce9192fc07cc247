//! Transaction pool error types.

use super::entities::QueueKind;
use shared_types::TransactionId;
use thiserror::Error;

/// Errors produced or surfaced by the transaction pool.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Duplicate ingress of an id that is already staged somewhere.
    #[error("Transaction is already processed: {0}")]
    AlreadyInPool(TransactionId),

    /// The target queue is at capacity.
    #[error("{queue} queue is full ({capacity} transactions)")]
    PoolFull {
        /// Queue that rejected the transaction.
        queue: QueueKind,
        /// Configured per-queue capacity.
        capacity: usize,
    },

    /// Sender account lookup returned nothing.
    #[error("Missing sender account: {0}")]
    SenderMissing(String),

    /// Requester account lookup returned nothing.
    #[error("Missing requester account: {0}")]
    RequesterMissing(String),

    /// Processing, normalization, or verification rejected the transaction.
    #[error("Failed to verify transaction {id}: {reason}")]
    VerifyFailed {
        /// The rejected transaction.
        id: TransactionId,
        /// Message from the transaction-logic layer.
        reason: String,
    },

    /// An id taken from a snapshot no longer resolves to a pooled entry.
    #[error("Missing transaction: {0}")]
    MissingTransaction(TransactionId),

    /// The account store failed during a lookup.
    #[error("Account lookup failed: {0}")]
    AccountLookup(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_full_names_the_queue() {
        let err = PoolError::PoolFull {
            queue: QueueKind::Multisignature,
            capacity: 1_000,
        };
        assert_eq!(
            err.to_string(),
            "multisignature queue is full (1000 transactions)"
        );
    }

    #[test]
    fn test_verify_failed_carries_the_reason() {
        let err = PoolError::VerifyFailed {
            id: "123".into(),
            reason: "Failed to verify signature".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("123"));
        assert!(msg.contains("Failed to verify signature"));
    }

    #[test]
    fn test_already_in_pool_display() {
        let err = PoolError::AlreadyInPool("42".into());
        assert_eq!(err.to_string(), "Transaction is already processed: 42");
    }
}
