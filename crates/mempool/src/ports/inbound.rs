//! Inbound (driving) ports of the transaction pool.
//!
//! Two surfaces drive the pool: the network receiver and local clients feed
//! candidate transactions through [`TransactionIngress`], and the block
//! producer drives selection, rewind, and expiry through [`ForgingApi`].

use crate::domain::{PoolError, Transaction, TransactionId};
use async_trait::async_trait;

/// Ingress surface for candidate transactions.
#[async_trait]
pub trait TransactionIngress: Send + Sync {
    /// Admit a batch of transactions.
    ///
    /// Outcomes are reported per transaction, in input order; a failing
    /// transaction never aborts the rest of the batch.
    async fn receive_transactions(
        &self,
        transactions: Vec<Transaction>,
        broadcast: bool,
    ) -> Vec<(TransactionId, Result<(), PoolError>)>;

    /// Admit a single transaction: dedup, verify, and stage it into its
    /// target queue.
    ///
    /// # Errors
    /// - `AlreadyInPool`: the id is staged somewhere already
    /// - `PoolFull`: the target queue is at capacity
    /// - `SenderMissing` / `RequesterMissing`: account lookups came up empty
    /// - `VerifyFailed`: the transaction-logic layer rejected it
    async fn process_unconfirmed_transaction(
        &self,
        transaction: Transaction,
        broadcast: bool,
    ) -> Result<(), PoolError>;
}

/// Hooks the block producer drives around forging.
#[async_trait]
pub trait ForgingApi: Send + Sync {
    /// Top up the unconfirmed set for the next block.
    ///
    /// Returns without selecting while the chain is syncing or the
    /// unconfirmed set already holds a block's worth of transactions.
    /// Per-transaction failures are logged, never surfaced.
    async fn fill_pool(&self);

    /// Roll the unconfirmed set back into the queued queue on chain
    /// rewind. Returns the ids that were considered.
    async fn undo_unconfirmed_list(&self) -> Vec<TransactionId>;

    /// Drop every staged entry that outlived its per-class time-to-live.
    /// Returns the expired ids.
    fn expire_transactions(&self) -> Vec<TransactionId>;

    /// Combined unconfirmed ∥ multisignature ∥ queued listing for sharing
    /// with peers. Bundled transactions are never included.
    fn get_merged_transaction_list(&self, reverse: bool, limit: usize) -> Vec<Transaction>;
}
