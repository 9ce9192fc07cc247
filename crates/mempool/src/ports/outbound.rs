//! Outbound (driven) ports of the transaction pool.
//!
//! The capabilities the pool consumes from the rest of the node. Every
//! collaborator call is a suspension point: other pool operations may run
//! between the stages of a pipeline, which is why long iterations snapshot
//! their queue before touching any of these.

use crate::domain::{Account, PublicKey, Timestamp, Transaction};
use async_trait::async_trait;
use thiserror::Error;

/// Account store failure (storage or transport layer).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LookupError(pub String);

/// Rejection from a transaction-logic stage, carrying that layer's message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LogicError(pub String);

/// Failure applying or undoing unconfirmed ledger effects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LedgerError(pub String);

/// Account snapshots for the verification pipeline.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Fetch-or-create the account owning `public_key`.
    ///
    /// `Ok(None)` means the account could not be materialized; the pool
    /// reports the transaction's sender as missing.
    async fn set_account_and_get(
        &self,
        public_key: &PublicKey,
    ) -> Result<Option<Account>, LookupError>;

    /// Fetch an existing account, for requester lookups.
    async fn get_account(&self, public_key: &PublicKey) -> Result<Option<Account>, LookupError>;
}

/// Ecosystem-specific preprocessing, canonicalization, and validation.
///
/// The pool runs these stages in order and short-circuits on the first
/// rejection; it never interprets the transaction body itself.
#[async_trait]
pub trait TransactionLogic: Send + Sync {
    /// Shape amount, fee, and asset for the transaction type.
    async fn process(
        &self,
        transaction: &mut Transaction,
        sender: &Account,
        requester: Option<&Account>,
    ) -> Result<(), LogicError>;

    /// Reduce the transaction to canonical form.
    fn object_normalize(&self, transaction: &mut Transaction) -> Result<(), LogicError>;

    /// Signature and business-rule checks against the sender snapshot.
    async fn verify(&self, transaction: &Transaction, sender: &Account) -> Result<(), LogicError>;
}

/// Mutators of the in-memory unconfirmed account state.
#[async_trait]
pub trait UnconfirmedLedger: Send + Sync {
    /// Apply the transaction's effects to the unconfirmed ledger.
    async fn apply_unconfirmed(
        &self,
        transaction: &Transaction,
        sender: &Account,
    ) -> Result<(), LedgerError>;

    /// Roll the transaction's effects back out of the unconfirmed ledger.
    async fn undo_unconfirmed(&self, transaction: &Transaction) -> Result<(), LedgerError>;
}

/// Chain synchronization status.
pub trait ChainLoader: Send + Sync {
    /// Whether the node is still catching up with the chain. Block filling
    /// is suppressed while this holds.
    fn is_syncing(&self) -> bool;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Mock account provider for testing.
#[cfg(test)]
#[derive(Default)]
pub struct MockAccounts {
    accounts: std::collections::HashMap<PublicKey, Account>,
    failing: bool,
}

#[cfg(test)]
impl MockAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.insert(account.public_key, account);
        self
    }

    pub fn failing() -> Self {
        Self {
            accounts: std::collections::HashMap::new(),
            failing: true,
        }
    }
}

#[cfg(test)]
#[async_trait]
impl AccountProvider for MockAccounts {
    async fn set_account_and_get(
        &self,
        public_key: &PublicKey,
    ) -> Result<Option<Account>, LookupError> {
        if self.failing {
            return Err(LookupError("Account store unavailable".into()));
        }
        Ok(self.accounts.get(public_key).cloned())
    }

    async fn get_account(&self, public_key: &PublicKey) -> Result<Option<Account>, LookupError> {
        self.set_account_and_get(public_key).await
    }
}

/// Mock transaction logic with configurable stage failures.
#[cfg(test)]
#[derive(Default)]
pub struct MockLogic {
    fail_process: bool,
    fail_normalize: bool,
    reject_verify: std::collections::HashSet<shared_types::TransactionId>,
    /// Ids verified so far, in order.
    pub verified: std::sync::Mutex<Vec<shared_types::TransactionId>>,
}

#[cfg(test)]
impl MockLogic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_process() -> Self {
        Self {
            fail_process: true,
            ..Self::default()
        }
    }

    pub fn failing_normalize() -> Self {
        Self {
            fail_normalize: true,
            ..Self::default()
        }
    }

    pub fn rejecting_verify(mut self, id: &str) -> Self {
        self.reject_verify.insert(id.into());
        self
    }
}

#[cfg(test)]
#[async_trait]
impl TransactionLogic for MockLogic {
    async fn process(
        &self,
        _transaction: &mut Transaction,
        _sender: &Account,
        _requester: Option<&Account>,
    ) -> Result<(), LogicError> {
        if self.fail_process {
            return Err(LogicError("Invalid transaction amount".into()));
        }
        Ok(())
    }

    fn object_normalize(&self, _transaction: &mut Transaction) -> Result<(), LogicError> {
        if self.fail_normalize {
            return Err(LogicError("Failed to validate transaction schema".into()));
        }
        Ok(())
    }

    async fn verify(&self, transaction: &Transaction, _sender: &Account) -> Result<(), LogicError> {
        if self.reject_verify.contains(&transaction.id) {
            return Err(LogicError("Failed to verify signature".into()));
        }
        self.verified.lock().unwrap().push(transaction.id.clone());
        Ok(())
    }
}

/// Mock unconfirmed ledger recording applies and undos.
#[cfg(test)]
#[derive(Default)]
pub struct MockLedger {
    fail_apply: std::collections::HashSet<shared_types::TransactionId>,
    fail_undo: std::collections::HashSet<shared_types::TransactionId>,
    /// Ids applied so far, in order.
    pub applied: std::sync::Mutex<Vec<shared_types::TransactionId>>,
    /// Ids undone so far, in order.
    pub undone: std::sync::Mutex<Vec<shared_types::TransactionId>>,
}

#[cfg(test)]
impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_apply(mut self, id: &str) -> Self {
        self.fail_apply.insert(id.into());
        self
    }

    pub fn failing_undo(mut self, id: &str) -> Self {
        self.fail_undo.insert(id.into());
        self
    }
}

#[cfg(test)]
#[async_trait]
impl UnconfirmedLedger for MockLedger {
    async fn apply_unconfirmed(
        &self,
        transaction: &Transaction,
        _sender: &Account,
    ) -> Result<(), LedgerError> {
        if self.fail_apply.contains(&transaction.id) {
            return Err(LedgerError("Balance exceeded".into()));
        }
        self.applied.lock().unwrap().push(transaction.id.clone());
        Ok(())
    }

    async fn undo_unconfirmed(&self, transaction: &Transaction) -> Result<(), LedgerError> {
        if self.fail_undo.contains(&transaction.id) {
            return Err(LedgerError("Failed to undo transaction".into()));
        }
        self.undone.lock().unwrap().push(transaction.id.clone());
        Ok(())
    }
}

/// Mock loader with a switchable sync flag.
#[cfg(test)]
pub struct MockLoader {
    syncing: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MockLoader {
    pub fn new(syncing: bool) -> Self {
        Self {
            syncing: std::sync::atomic::AtomicBool::new(syncing),
        }
    }

    pub fn set_syncing(&self, syncing: bool) {
        self.syncing
            .store(syncing, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl ChainLoader for MockLoader {
    fn is_syncing(&self) -> bool {
        self.syncing.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// Mock time source for testing.
#[cfg(test)]
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl MockTimeSource {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}
