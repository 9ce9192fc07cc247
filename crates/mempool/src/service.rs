//! Transaction pool service.
//!
//! Receives candidate transactions from peers and local clients, verifies
//! them against account state, stages them across four queues, and hands
//! the block producer a ready-to-forge slice on demand.
//!
//! ```text
//! receiver ──→ admission ──→ (bundled? ──→ bundle tick) ──→ verify
//!                                                             │
//!                                    ┌────────────────────────┤
//!                                    ▼                        ▼
//!                                 queued              multisignature
//!                                    │                        │
//!                                    └──────── fill ──────────┘
//!                                              │
//!                                              ▼
//!                                         unconfirmed ──→ block
//! ```
//!
//! All queue state lives behind one `RwLock`; collaborator calls are the
//! only suspension points and always happen with the lock released. Loops
//! over a queue snapshot it first and tolerate entries that were removed
//! while they were suspended.

use crate::adapters::publisher::PoolEventPublisher;
use crate::domain::{
    Account, PoolConfig, PoolError, PoolStatus, PooledTransaction, QueueKind, QueueStore,
    Timestamp, Transaction, TransactionId,
};
use crate::ports::inbound::{ForgingApi, TransactionIngress};
use crate::ports::outbound::{
    AccountProvider, ChainLoader, TimeSource, TransactionLogic, UnconfirmedLedger,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Multisignature transactions admitted into a single block fill.
const MULTISIG_FILL_QUOTA: usize = 5;

/// The transaction pool.
///
/// Constructed once with its collaborators and shared behind an `Arc`; the
/// periodic jobs in [`crate::jobs`] capture a reference to it.
pub struct TransactionPool<A, L, W, C>
where
    A: AccountProvider,
    L: TransactionLogic,
    W: UnconfirmedLedger,
    C: ChainLoader,
{
    config: PoolConfig,
    queues: RwLock<QueueStore>,
    accounts: Arc<A>,
    logic: Arc<L>,
    ledger: Arc<W>,
    loader: Arc<C>,
    events: Arc<dyn PoolEventPublisher>,
    clock: Arc<dyn TimeSource>,
}

impl<A, L, W, C> TransactionPool<A, L, W, C>
where
    A: AccountProvider,
    L: TransactionLogic,
    W: UnconfirmedLedger,
    C: ChainLoader,
{
    /// Create a pool wired to its collaborators.
    pub fn new(
        config: PoolConfig,
        accounts: Arc<A>,
        logic: Arc<L>,
        ledger: Arc<W>,
        loader: Arc<C>,
        events: Arc<dyn PoolEventPublisher>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            queues: RwLock::new(QueueStore::new()),
            accounts,
            logic,
            ledger,
            loader,
            events,
            clock,
        }
    }

    /// The pool's configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    /// Whether `id` is staged in any queue.
    pub fn transaction_in_pool(&self, id: &str) -> bool {
        self.queues.read().in_pool(id)
    }

    /// The unconfirmed transaction with `id`, if any.
    pub fn get_unconfirmed_transaction(&self, id: &str) -> Option<Transaction> {
        self.get_from(QueueKind::Unconfirmed, id)
    }

    /// The bundled transaction with `id`, if any.
    pub fn get_bundled_transaction(&self, id: &str) -> Option<Transaction> {
        self.get_from(QueueKind::Bundled, id)
    }

    /// The queued transaction with `id`, if any.
    pub fn get_queued_transaction(&self, id: &str) -> Option<Transaction> {
        self.get_from(QueueKind::Queued, id)
    }

    /// The multisignature transaction with `id`, if any.
    pub fn get_multisignature_transaction(&self, id: &str) -> Option<Transaction> {
        self.get_from(QueueKind::Multisignature, id)
    }

    fn get_from(&self, kind: QueueKind, id: &str) -> Option<Transaction> {
        self.queues
            .read()
            .queue(kind)
            .get(id)
            .map(|entry| entry.transaction.clone())
    }

    /// Unconfirmed transactions, newest last (or first with `reverse`),
    /// truncated to `limit` (`0` meaning no limit).
    pub fn get_unconfirmed_transaction_list(&self, reverse: bool, limit: usize) -> Vec<Transaction> {
        self.list_from(QueueKind::Unconfirmed, reverse, limit)
    }

    /// Bundled transactions awaiting the next bundle tick.
    pub fn get_bundled_transaction_list(&self, reverse: bool, limit: usize) -> Vec<Transaction> {
        self.list_from(QueueKind::Bundled, reverse, limit)
    }

    /// Queued transactions awaiting block-fill selection.
    pub fn get_queued_transaction_list(&self, reverse: bool, limit: usize) -> Vec<Transaction> {
        self.list_from(QueueKind::Queued, reverse, limit)
    }

    /// Multisignature transactions. With `ready` the listing is filtered to
    /// entries whose signature group is complete and the `limit` argument
    /// has no effect.
    pub fn get_multisignature_transaction_list(
        &self,
        reverse: bool,
        ready: bool,
        limit: usize,
    ) -> Vec<Transaction> {
        if ready {
            self.queues
                .read()
                .multisignature
                .list(reverse, 0)
                .into_iter()
                .filter(|entry| entry.transaction.ready)
                .map(|entry| entry.transaction)
                .collect()
        } else {
            self.list_from(QueueKind::Multisignature, reverse, limit)
        }
    }

    fn list_from(&self, kind: QueueKind, reverse: bool, limit: usize) -> Vec<Transaction> {
        self.queues
            .read()
            .queue(kind)
            .list(reverse, limit)
            .into_iter()
            .map(|entry| entry.transaction)
            .collect()
    }

    /// Number of unconfirmed transactions.
    pub fn count_unconfirmed(&self) -> usize {
        self.queues.read().unconfirmed.count()
    }

    /// Number of bundled transactions.
    pub fn count_bundled(&self) -> usize {
        self.queues.read().bundled.count()
    }

    /// Number of queued transactions.
    pub fn count_queued(&self) -> usize {
        self.queues.read().queued.count()
    }

    /// Number of multisignature transactions.
    pub fn count_multisignature(&self) -> usize {
        self.queues.read().multisignature.count()
    }

    /// Live-count snapshot of all queues.
    pub fn status(&self) -> PoolStatus {
        let queues = self.queues.read();
        PoolStatus {
            unconfirmed: queues.unconfirmed.count(),
            bundled: queues.bundled.count(),
            queued: queues.queued.count(),
            multisignature: queues.multisignature.count(),
        }
    }

    // =========================================================================
    // MUTATORS
    // =========================================================================

    /// Stage an entry as unconfirmed, clearing its id from the queued and
    /// multisignature queues first.
    pub fn add_unconfirmed_transaction(&self, entry: PooledTransaction) {
        let mut queues = self.queues.write();
        queues.queued.remove(entry.id());
        queues.multisignature.remove(entry.id());
        queues.unconfirmed.add(entry);
    }

    /// Drop `id` from the unconfirmed, queued, and multisignature queues.
    pub fn remove_unconfirmed_transaction(&self, id: &str) {
        let mut queues = self.queues.write();
        queues.unconfirmed.remove(id);
        queues.queued.remove(id);
        queues.multisignature.remove(id);
    }

    /// Stage an entry directly into the bundled queue.
    pub fn add_bundled_transaction(&self, entry: PooledTransaction) {
        self.queues.write().bundled.add(entry);
    }

    /// Drop `id` from the bundled queue.
    pub fn remove_bundled_transaction(&self, id: &str) {
        self.queues.write().bundled.remove(id);
    }

    /// Stage an entry directly into the queued queue.
    pub fn add_queued_transaction(&self, entry: PooledTransaction) {
        self.queues.write().queued.add(entry);
    }

    /// Drop `id` from the queued queue.
    pub fn remove_queued_transaction(&self, id: &str) {
        self.queues.write().queued.remove(id);
    }

    /// Stage an entry directly into the multisignature queue.
    pub fn add_multisignature_transaction(&self, entry: PooledTransaction) {
        self.queues.write().multisignature.add(entry);
    }

    /// Drop `id` from the multisignature queue.
    pub fn remove_multisignature_transaction(&self, id: &str) {
        self.queues.write().multisignature.remove(id);
    }

    /// Compact every queue, dropping tombstones and rebuilding the indices.
    pub fn reindex_queues(&self) {
        self.queues.write().reindex_all();
        debug!("Reindexed transaction queues");
    }

    // =========================================================================
    // ADMISSION
    // =========================================================================

    /// Admit a batch of transactions, reporting an outcome per transaction.
    pub async fn receive_transactions(
        &self,
        transactions: Vec<Transaction>,
        broadcast: bool,
    ) -> Vec<(TransactionId, Result<(), PoolError>)> {
        let mut outcomes = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let id = transaction.id.clone();
            let outcome = self.process_unconfirmed_transaction(transaction, broadcast).await;
            if let Err(e) = &outcome {
                debug!(id = %id, error = %e, "Rejected received transaction");
            }
            outcomes.push((id, outcome));
        }
        outcomes
    }

    /// Admit a single transaction: dedup, verify, and stage it.
    ///
    /// Bundled transactions skip verification here; the bundle tick verifies
    /// them in bulk later.
    pub async fn process_unconfirmed_transaction(
        &self,
        mut transaction: Transaction,
        broadcast: bool,
    ) -> Result<(), PoolError> {
        {
            let mut queues = self.queues.write();
            if queues.in_pool(&transaction.id) {
                return Err(PoolError::AlreadyInPool(transaction.id));
            }
            if queues.note_processed() {
                debug!("Reindexed transaction queues");
            }
        }

        if transaction.bundled {
            return self.queue_transaction(transaction);
        }

        self.process_verify_transaction(&mut transaction, broadcast)
            .await?;
        self.queue_transaction(transaction)
    }

    /// Stamp a transaction and stage it into its target queue.
    ///
    /// Routing: `bundled` flag wins, then multisignature classification,
    /// then the plain queue. A duplicate add is a silent no-op.
    ///
    /// # Errors
    /// `PoolFull` when the target queue is at capacity.
    pub fn queue_transaction(&self, transaction: Transaction) -> Result<(), PoolError> {
        let entry = PooledTransaction::new(transaction, self.clock.now());
        let kind = if entry.transaction.bundled {
            QueueKind::Bundled
        } else if entry.class.is_multisignature() {
            QueueKind::Multisignature
        } else {
            QueueKind::Queued
        };

        let mut queues = self.queues.write();
        if queues.queue(kind).count() >= self.config.max_txs_per_queue {
            return Err(PoolError::PoolFull {
                queue: kind,
                capacity: self.config.max_txs_per_queue,
            });
        }
        queues.queue_mut(kind).add(entry);
        Ok(())
    }

    // =========================================================================
    // VERIFICATION
    // =========================================================================

    /// Run the verification pipeline against the sender snapshot, publishing
    /// the unconfirmed-transaction event once on success.
    ///
    /// Returns the sender so callers can apply ledger effects against the
    /// same snapshot.
    async fn process_verify_transaction(
        &self,
        transaction: &mut Transaction,
        broadcast: bool,
    ) -> Result<Account, PoolError> {
        let sender = self
            .accounts
            .set_account_and_get(&transaction.sender_public_key)
            .await
            .map_err(|e| PoolError::AccountLookup(e.to_string()))?
            .ok_or_else(|| PoolError::SenderMissing(transaction.sender_hex()))?;

        let requester = if sender.is_multisignature() {
            // A multisignature sender implies a signature list, even while
            // it is still empty.
            if transaction.signatures.is_none() {
                transaction.signatures = Some(Vec::new());
            }
            match transaction.requester_public_key {
                Some(requester_key) => Some(
                    self.accounts
                        .get_account(&requester_key)
                        .await
                        .map_err(|e| PoolError::AccountLookup(e.to_string()))?
                        .ok_or_else(|| PoolError::RequesterMissing(hex::encode(requester_key)))?,
                ),
                None => None,
            }
        } else {
            None
        };

        self.logic
            .process(transaction, &sender, requester.as_ref())
            .await
            .map_err(|e| PoolError::VerifyFailed {
                id: transaction.id.clone(),
                reason: e.to_string(),
            })?;

        self.logic
            .object_normalize(transaction)
            .map_err(|e| PoolError::VerifyFailed {
                id: transaction.id.clone(),
                reason: e.to_string(),
            })?;

        self.logic
            .verify(transaction, &sender)
            .await
            .map_err(|e| PoolError::VerifyFailed {
                id: transaction.id.clone(),
                reason: e.to_string(),
            })?;

        self.events
            .unconfirmed_transaction(transaction.clone(), broadcast)
            .await;

        Ok(sender)
    }

    // =========================================================================
    // PERIODIC WORK
    // =========================================================================

    /// Drain a slice of the bundled queue: verify each entry in bulk and
    /// stage it for block selection. One bad transaction never aborts the
    /// tick.
    pub async fn process_bundled(&self) {
        let batch = self
            .queues
            .read()
            .bundled
            .list(true, self.config.release_limit);

        for snapshot_entry in batch {
            let id = snapshot_entry.id().clone();
            // The entry may have been drained by someone else since the
            // snapshot was taken.
            let Some(entry) = self.queues.write().bundled.remove(&id) else {
                continue;
            };

            let mut transaction = entry.transaction;
            transaction.bundled = false;

            match self.process_verify_transaction(&mut transaction, true).await {
                Ok(_sender) => {
                    if let Err(e) = self.queue_transaction(transaction) {
                        error!(id = %id, error = %e, "Failed to queue bundled transaction");
                    }
                }
                Err(e) => {
                    error!(id = %id, error = %e, "Failed to process bundled transaction");
                }
            }
        }
    }

    /// Sweep the unconfirmed, queued, and multisignature queues, dropping
    /// every entry that outlived its per-class time-to-live. Bundled
    /// entries never expire; the bundle tick gets to them first.
    pub fn expire_transactions(&self) -> Vec<TransactionId> {
        let now = self.clock.now();
        let mut expired = Vec::new();
        for kind in [
            QueueKind::Unconfirmed,
            QueueKind::Queued,
            QueueKind::Multisignature,
        ] {
            self.expire_queue(kind, now, &mut expired);
        }
        expired
    }

    fn expire_queue(&self, kind: QueueKind, now: Timestamp, expired: &mut Vec<TransactionId>) {
        let snapshot = self.queues.read().queue(kind).list(true, 0);
        for entry in snapshot {
            if !self.queues.read().queue(kind).contains(entry.id()) {
                continue;
            }
            if entry.is_expired(now, self.config.unconfirmed_timeout_secs) {
                info!(id = %entry.id(), queue = %kind, "Expired transaction");
                self.remove_unconfirmed_transaction(entry.id());
                expired.push(entry.id().clone());
            }
        }
    }

    // =========================================================================
    // BLOCK PRODUCER HOOKS
    // =========================================================================

    /// Top up the unconfirmed set for the next block: up to five ready
    /// multisignature transactions, the rest from the plain queue, all
    /// re-verified and applied to the unconfirmed ledger.
    pub async fn fill_pool(&self) {
        if self.loader.is_syncing() {
            return;
        }

        let unconfirmed_count = self.count_unconfirmed();
        if unconfirmed_count >= self.config.max_txs_per_block {
            return;
        }
        let spare = self.config.max_txs_per_block - unconfirmed_count;

        let multisig_quota = if spare >= MULTISIG_FILL_QUOTA {
            MULTISIG_FILL_QUOTA
        } else {
            0
        };
        let mut selected: Vec<TransactionId> = self
            .queues
            .read()
            .multisignature
            .list(true, 0)
            .into_iter()
            .filter(|entry| entry.transaction.ready)
            .take(multisig_quota)
            .map(|entry| entry.id().clone())
            .collect();

        // The quota never exceeds the spare; abs_diff keeps the arithmetic
        // total anyway.
        let remaining = spare.abs_diff(selected.len());
        if remaining > 0 {
            selected.extend(
                self.queues
                    .read()
                    .queued
                    .list(true, remaining)
                    .into_iter()
                    .map(|entry| entry.id().clone()),
            );
        }

        debug!(count = selected.len(), "Filling unconfirmed set");
        self.apply_unconfirmed_list(selected).await;
    }

    /// Verify and apply staged transactions as unconfirmed. Failures drop
    /// the entry and are logged; the batch itself never fails.
    async fn apply_unconfirmed_list(&self, ids: Vec<TransactionId>) {
        for id in ids {
            // Entries can disappear between selection and application.
            let Some(mut entry) = self.staged_transaction(&id) else {
                debug!(error = %PoolError::MissingTransaction(id), "Skipped vanished transaction");
                continue;
            };

            let sender = match self
                .process_verify_transaction(&mut entry.transaction, false)
                .await
            {
                Ok(sender) => sender,
                Err(e) => {
                    error!(id = %id, error = %e, "Failed to verify unconfirmed transaction");
                    self.remove_unconfirmed_transaction(&id);
                    continue;
                }
            };

            if let Err(e) = self
                .ledger
                .apply_unconfirmed(&entry.transaction, &sender)
                .await
            {
                error!(id = %id, error = %e, "Failed to apply unconfirmed transaction");
                self.remove_unconfirmed_transaction(&id);
                continue;
            }

            self.add_unconfirmed_transaction(entry);
        }
    }

    /// The staged entry for `id`, from the queued or multisignature queue.
    fn staged_transaction(&self, id: &str) -> Option<PooledTransaction> {
        let queues = self.queues.read();
        queues
            .queued
            .get(id)
            .or_else(|| queues.multisignature.get(id))
            .cloned()
    }

    /// Walk the unconfirmed set on chain rewind: undo ledger effects and
    /// return each entry to the queued queue, whatever its class. An entry
    /// whose undo fails is dropped entirely. Returns the ids considered.
    pub async fn undo_unconfirmed_list(&self) -> Vec<TransactionId> {
        let snapshot = self.queues.read().unconfirmed.list(false, 0);
        let mut ids = Vec::with_capacity(snapshot.len());

        for entry in snapshot {
            let id = entry.id().clone();
            ids.push(id.clone());

            match self.ledger.undo_unconfirmed(&entry.transaction).await {
                Ok(()) => {
                    self.remove_unconfirmed_transaction(&id);
                    self.queues.write().queued.add(entry);
                }
                Err(e) => {
                    error!(id = %id, error = %e, "Failed to undo unconfirmed transaction");
                    self.remove_unconfirmed_transaction(&id);
                }
            }
        }
        ids
    }

    /// Combined unconfirmed ∥ multisignature ∥ queued listing for sharing
    /// with peers, bounded by the shared-listing cap. Bundled transactions
    /// are never included.
    pub fn get_merged_transaction_list(&self, reverse: bool, limit: usize) -> Vec<Transaction> {
        let ceiling = self.config.max_txs_per_block + 2;
        let mut limit = limit;
        if limit <= ceiling || limit > self.config.max_shared_txs {
            limit = ceiling;
        }

        let mut merged =
            self.get_unconfirmed_transaction_list(reverse, self.config.max_txs_per_block);
        limit = limit.saturating_sub(merged.len());

        let multisignature =
            self.get_multisignature_transaction_list(reverse, false, self.config.max_txs_per_block);
        limit = limit.saturating_sub(multisignature.len());
        merged.extend(multisignature);

        if limit > 0 {
            merged.extend(self.get_queued_transaction_list(reverse, limit));
        }
        merged
    }
}

#[async_trait]
impl<A, L, W, C> TransactionIngress for TransactionPool<A, L, W, C>
where
    A: AccountProvider,
    L: TransactionLogic,
    W: UnconfirmedLedger,
    C: ChainLoader,
{
    async fn receive_transactions(
        &self,
        transactions: Vec<Transaction>,
        broadcast: bool,
    ) -> Vec<(TransactionId, Result<(), PoolError>)> {
        TransactionPool::receive_transactions(self, transactions, broadcast).await
    }

    async fn process_unconfirmed_transaction(
        &self,
        transaction: Transaction,
        broadcast: bool,
    ) -> Result<(), PoolError> {
        TransactionPool::process_unconfirmed_transaction(self, transaction, broadcast).await
    }
}

#[async_trait]
impl<A, L, W, C> ForgingApi for TransactionPool<A, L, W, C>
where
    A: AccountProvider,
    L: TransactionLogic,
    W: UnconfirmedLedger,
    C: ChainLoader,
{
    async fn fill_pool(&self) {
        TransactionPool::fill_pool(self).await;
    }

    async fn undo_unconfirmed_list(&self) -> Vec<TransactionId> {
        TransactionPool::undo_unconfirmed_list(self).await
    }

    fn expire_transactions(&self) -> Vec<TransactionId> {
        TransactionPool::expire_transactions(self)
    }

    fn get_merged_transaction_list(&self, reverse: bool, limit: usize) -> Vec<Transaction> {
        TransactionPool::get_merged_transaction_list(self, reverse, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::publisher::RecordingPublisher;
    use crate::domain::entities::TransactionType;
    use crate::ports::outbound::{MockAccounts, MockLedger, MockLoader, MockLogic, MockTimeSource};
    use shared_types::MultisignatureAsset;

    const SENDER: shared_types::PublicKey = [0xAA; 32];
    const REQUESTER: shared_types::PublicKey = [0xBB; 32];
    const START_TIME: Timestamp = 1_000_000;

    fn sender_account() -> Account {
        Account {
            address: "16313739661670634666L".into(),
            public_key: SENDER,
            balance: 100_000_000,
            second_public_key: None,
            multisignatures: Vec::new(),
            multimin: 0,
        }
    }

    fn multisig_sender_account() -> Account {
        Account {
            multisignatures: vec![[0xCC; 32], [0xDD; 32]],
            multimin: 2,
            ..sender_account()
        }
    }

    fn requester_account() -> Account {
        Account {
            address: "2460251951231579923L".into(),
            public_key: REQUESTER,
            ..sender_account()
        }
    }

    fn plain_tx(id: &str) -> Transaction {
        Transaction {
            id: id.into(),
            tx_type: TransactionType::Transfer,
            amount: 100,
            fee: 10,
            sender_public_key: SENDER,
            requester_public_key: None,
            recipient_id: Some("123L".into()),
            signature: Some([0x01; 64]),
            signatures: None,
            asset: None,
            bundled: false,
            ready: false,
        }
    }

    fn bundled_tx(id: &str) -> Transaction {
        Transaction {
            bundled: true,
            ..plain_tx(id)
        }
    }

    fn signed_tx(id: &str) -> Transaction {
        Transaction {
            signatures: Some(vec![]),
            ..plain_tx(id)
        }
    }

    fn ready_multisig_tx(id: &str) -> Transaction {
        Transaction {
            ready: true,
            ..signed_tx(id)
        }
    }

    fn registration_tx(id: &str, lifetime: u32) -> Transaction {
        Transaction {
            tx_type: TransactionType::MultisigRegistration,
            recipient_id: None,
            asset: Some(MultisignatureAsset {
                min: 2,
                lifetime,
                keysgroup: vec!["+cc".into(), "+dd".into()],
            }),
            ..plain_tx(id)
        }
    }

    struct TestPool {
        pool: TransactionPool<MockAccounts, MockLogic, MockLedger, MockLoader>,
        logic: Arc<MockLogic>,
        ledger: Arc<MockLedger>,
        loader: Arc<MockLoader>,
        events: Arc<RecordingPublisher>,
        clock: Arc<MockTimeSource>,
    }

    fn harness(
        config: PoolConfig,
        accounts: MockAccounts,
        logic: MockLogic,
        ledger: MockLedger,
    ) -> TestPool {
        let logic = Arc::new(logic);
        let ledger = Arc::new(ledger);
        let loader = Arc::new(MockLoader::new(false));
        let events = Arc::new(RecordingPublisher::new());
        let clock = Arc::new(MockTimeSource::new(START_TIME));
        let events_port: Arc<dyn PoolEventPublisher> = events.clone();
        let clock_port: Arc<dyn TimeSource> = clock.clone();
        let pool = TransactionPool::new(
            config,
            Arc::new(accounts),
            Arc::clone(&logic),
            Arc::clone(&ledger),
            Arc::clone(&loader),
            events_port,
            clock_port,
        );
        TestPool {
            pool,
            logic,
            ledger,
            loader,
            events,
            clock,
        }
    }

    fn default_harness() -> TestPool {
        harness(
            PoolConfig::for_testing(),
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new(),
            MockLedger::new(),
        )
    }

    fn pooled(transaction: Transaction) -> PooledTransaction {
        PooledTransaction::new(transaction, START_TIME)
    }

    // =========================================================================
    // ADMISSION
    // =========================================================================

    #[tokio::test]
    async fn test_plain_transaction_lands_in_queued() {
        let t = default_harness();

        t.pool
            .process_unconfirmed_transaction(plain_tx("A"), true)
            .await
            .unwrap();

        assert!(t.pool.transaction_in_pool("A"));
        assert_eq!(t.pool.count_queued(), 1);
        assert_eq!(t.pool.get_queued_transaction("A").unwrap().id, "A");
        assert_eq!(
            *t.events.announced.lock().unwrap(),
            [("A".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn test_bundled_transaction_skips_inline_verification() {
        let t = default_harness();

        t.pool
            .process_unconfirmed_transaction(bundled_tx("B"), true)
            .await
            .unwrap();

        assert_eq!(t.pool.count_bundled(), 1);
        assert!(t.logic.verified.lock().unwrap().is_empty());
        assert!(t.events.announced.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registration_routes_to_multisignature() {
        let t = default_harness();

        t.pool
            .process_unconfirmed_transaction(registration_tx("R", 1), false)
            .await
            .unwrap();

        assert_eq!(t.pool.count_multisignature(), 1);
        assert!(t.pool.get_multisignature_transaction("R").is_some());
        assert_eq!(t.pool.count_queued(), 0);
    }

    #[tokio::test]
    async fn test_signature_bearing_routes_to_multisignature() {
        let t = default_harness();

        t.pool
            .process_unconfirmed_transaction(signed_tx("S"), false)
            .await
            .unwrap();

        assert_eq!(t.pool.count_multisignature(), 1);
        assert_eq!(t.pool.count_queued(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_ingress_rejected() {
        let t = default_harness();

        t.pool
            .process_unconfirmed_transaction(plain_tx("A"), false)
            .await
            .unwrap();
        let second = t
            .pool
            .process_unconfirmed_transaction(plain_tx("A"), false)
            .await;

        assert_eq!(second, Err(PoolError::AlreadyInPool("A".into())));
        assert_eq!(t.pool.count_queued(), 1);
    }

    #[tokio::test]
    async fn test_queue_capacity_boundary() {
        let config = PoolConfig {
            max_txs_per_queue: 2,
            ..PoolConfig::for_testing()
        };
        let t = harness(
            config,
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new(),
            MockLedger::new(),
        );

        t.pool
            .process_unconfirmed_transaction(plain_tx("a"), false)
            .await
            .unwrap();
        t.pool
            .process_unconfirmed_transaction(plain_tx("b"), false)
            .await
            .unwrap();

        let overflow = t
            .pool
            .process_unconfirmed_transaction(plain_tx("c"), false)
            .await;
        assert_eq!(
            overflow,
            Err(PoolError::PoolFull {
                queue: QueueKind::Queued,
                capacity: 2,
            })
        );

        // Freeing a slot lets the next ingress through.
        t.pool.remove_queued_transaction("a");
        t.pool
            .process_unconfirmed_transaction(plain_tx("c"), false)
            .await
            .unwrap();
        assert_eq!(t.pool.count_queued(), 2);
    }

    #[tokio::test]
    async fn test_sender_missing_rejected() {
        let t = harness(
            PoolConfig::for_testing(),
            MockAccounts::new(),
            MockLogic::new(),
            MockLedger::new(),
        );

        let outcome = t
            .pool
            .process_unconfirmed_transaction(plain_tx("A"), false)
            .await;

        assert_eq!(
            outcome,
            Err(PoolError::SenderMissing(hex::encode(SENDER)))
        );
        assert!(!t.pool.transaction_in_pool("A"));
    }

    #[tokio::test]
    async fn test_account_store_failure_surfaces() {
        let t = harness(
            PoolConfig::for_testing(),
            MockAccounts::failing(),
            MockLogic::new(),
            MockLedger::new(),
        );

        let outcome = t
            .pool
            .process_unconfirmed_transaction(plain_tx("A"), false)
            .await;

        assert_eq!(
            outcome,
            Err(PoolError::AccountLookup("Account store unavailable".into()))
        );
    }

    #[tokio::test]
    async fn test_verify_failure_not_staged() {
        let t = harness(
            PoolConfig::for_testing(),
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new().rejecting_verify("A"),
            MockLedger::new(),
        );

        let outcome = t
            .pool
            .process_unconfirmed_transaction(plain_tx("A"), true)
            .await;

        assert_eq!(
            outcome,
            Err(PoolError::VerifyFailed {
                id: "A".into(),
                reason: "Failed to verify signature".into(),
            })
        );
        assert!(!t.pool.transaction_in_pool("A"));
        assert!(t.events.announced.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_stage_failure_carries_logic_message() {
        let t = harness(
            PoolConfig::for_testing(),
            MockAccounts::new().with_account(sender_account()),
            MockLogic::failing_process(),
            MockLedger::new(),
        );

        let outcome = t
            .pool
            .process_unconfirmed_transaction(plain_tx("A"), false)
            .await;

        assert_eq!(
            outcome,
            Err(PoolError::VerifyFailed {
                id: "A".into(),
                reason: "Invalid transaction amount".into(),
            })
        );
    }

    #[tokio::test]
    async fn test_normalize_stage_failure_carries_logic_message() {
        let t = harness(
            PoolConfig::for_testing(),
            MockAccounts::new().with_account(sender_account()),
            MockLogic::failing_normalize(),
            MockLedger::new(),
        );

        let outcome = t
            .pool
            .process_unconfirmed_transaction(plain_tx("A"), false)
            .await;

        assert_eq!(
            outcome,
            Err(PoolError::VerifyFailed {
                id: "A".into(),
                reason: "Failed to validate transaction schema".into(),
            })
        );
        assert!(!t.pool.transaction_in_pool("A"));
    }

    #[tokio::test]
    async fn test_requester_missing_rejected() {
        let t = harness(
            PoolConfig::for_testing(),
            MockAccounts::new().with_account(multisig_sender_account()),
            MockLogic::new(),
            MockLedger::new(),
        );

        let mut tx = plain_tx("A");
        tx.requester_public_key = Some(REQUESTER);
        let outcome = t.pool.process_unconfirmed_transaction(tx, false).await;

        assert_eq!(
            outcome,
            Err(PoolError::RequesterMissing(hex::encode(REQUESTER)))
        );
    }

    #[tokio::test]
    async fn test_multisig_sender_gets_signature_list_defaulted() {
        let t = harness(
            PoolConfig::for_testing(),
            MockAccounts::new()
                .with_account(multisig_sender_account())
                .with_account(requester_account()),
            MockLogic::new(),
            MockLedger::new(),
        );

        let mut tx = plain_tx("A");
        tx.requester_public_key = Some(REQUESTER);
        t.pool
            .process_unconfirmed_transaction(tx, false)
            .await
            .unwrap();

        // The defaulted (empty) signature list reroutes the transaction to
        // the multisignature queue.
        let staged = t.pool.get_multisignature_transaction("A").unwrap();
        assert_eq!(staged.signatures, Some(vec![]));
        assert_eq!(t.pool.count_queued(), 0);
    }

    #[tokio::test]
    async fn test_receive_transactions_continues_past_failures() {
        let t = default_harness();

        let outcomes = t
            .pool
            .receive_transactions(vec![plain_tx("a"), plain_tx("a"), plain_tx("b")], false)
            .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0], ("a".to_string(), Ok(())));
        assert_eq!(
            outcomes[1],
            ("a".to_string(), Err(PoolError::AlreadyInPool("a".into())))
        );
        assert_eq!(outcomes[2], ("b".to_string(), Ok(())));
        assert_eq!(t.pool.count_queued(), 2);
    }

    #[tokio::test]
    async fn test_compaction_after_reindex_threshold() {
        let config = PoolConfig {
            max_txs_per_queue: 2_000,
            ..PoolConfig::for_testing()
        };
        let t = harness(
            config,
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new(),
            MockLedger::new(),
        );

        for i in 0..1_001 {
            t.pool
                .process_unconfirmed_transaction(bundled_tx(&format!("tx-{i}")), false)
                .await
                .unwrap();

            // Leave some tombstones behind for the compaction to collect.
            if i == 500 {
                t.pool.remove_bundled_transaction("tx-10");
                t.pool.remove_bundled_transaction("tx-11");
                t.pool.remove_bundled_transaction("tx-12");
            }
        }

        let queues = t.pool.queues.read();
        assert_eq!(queues.processed(), 1);
        assert_eq!(queues.bundled.count(), 998);
        assert_eq!(queues.bundled.slot_count(), queues.bundled.count());
    }

    // =========================================================================
    // LISTINGS
    // =========================================================================

    #[tokio::test]
    async fn test_ready_filter_ignores_limit() {
        let t = default_harness();

        for id in ["m1", "m2", "m3"] {
            t.pool.queue_transaction(ready_multisig_tx(id)).unwrap();
        }
        t.pool.queue_transaction(signed_tx("pending")).unwrap();

        let ready = t.pool.get_multisignature_transaction_list(false, true, 1);
        assert_eq!(ready.len(), 3);
        assert!(ready.iter().all(|tx| tx.ready));

        // Without the filter the limit applies as usual.
        let capped = t.pool.get_multisignature_transaction_list(false, false, 2);
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn test_merged_list_composition() {
        let config = PoolConfig {
            max_txs_per_block: 2,
            ..PoolConfig::for_testing()
        };
        let t = harness(
            config,
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new(),
            MockLedger::new(),
        );

        t.pool.add_unconfirmed_transaction(pooled(plain_tx("u1")));
        t.pool.add_unconfirmed_transaction(pooled(plain_tx("u2")));
        t.pool.queue_transaction(signed_tx("m1")).unwrap();
        t.pool.queue_transaction(signed_tx("m2")).unwrap();
        for id in ["q1", "q2", "q3"] {
            t.pool.queue_transaction(plain_tx(id)).unwrap();
        }
        t.pool.queue_transaction(bundled_tx("hidden")).unwrap();

        // A zero limit resets to the block ceiling (2 + 2); the unconfirmed
        // and multisignature slices consume it entirely.
        let merged = t.pool.get_merged_transaction_list(false, 0);
        let ids: Vec<_> = merged.iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, ["u1", "u2", "m1", "m2"]);

        // A larger (valid) limit leaves room for the queued remainder, and
        // bundled entries never appear.
        let merged = t.pool.get_merged_transaction_list(false, 10);
        let ids: Vec<_> = merged.iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, ["u1", "u2", "m1", "m2", "q1", "q2", "q3"]);
    }

    // =========================================================================
    // BUNDLE PROCESSING
    // =========================================================================

    #[tokio::test]
    async fn test_process_bundled_stages_entries() {
        let t = default_harness();

        t.pool
            .process_unconfirmed_transaction(bundled_tx("plain"), false)
            .await
            .unwrap();
        t.pool
            .process_unconfirmed_transaction(
                Transaction {
                    signatures: Some(vec![]),
                    ..bundled_tx("multi")
                },
                false,
            )
            .await
            .unwrap();

        t.pool.process_bundled().await;

        assert_eq!(t.pool.count_bundled(), 0);
        let staged = t.pool.get_queued_transaction("plain").unwrap();
        assert!(!staged.bundled);
        assert!(t.pool.get_multisignature_transaction("multi").is_some());

        // Bundle verification announces with the relay flag set.
        let announced = t.events.announced.lock().unwrap();
        assert_eq!(announced.len(), 2);
        assert!(announced.iter().all(|(_, broadcast)| *broadcast));
    }

    #[tokio::test]
    async fn test_process_bundled_respects_release_limit() {
        let config = PoolConfig {
            release_limit: 2,
            ..PoolConfig::for_testing()
        };
        let t = harness(
            config,
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new(),
            MockLedger::new(),
        );

        for id in ["a", "b", "c"] {
            t.pool
                .process_unconfirmed_transaction(bundled_tx(id), false)
                .await
                .unwrap();
        }

        // The drain walks the queue in reverse, so the oldest entry waits
        // for the next tick.
        t.pool.process_bundled().await;
        assert_eq!(t.pool.count_bundled(), 1);
        assert!(t.pool.get_bundled_transaction("a").is_some());
        assert_eq!(t.pool.count_queued(), 2);

        t.pool.process_bundled().await;
        assert_eq!(t.pool.count_bundled(), 0);
        assert_eq!(t.pool.count_queued(), 3);
    }

    #[tokio::test]
    async fn test_process_bundled_drops_unverifiable_entries() {
        let t = harness(
            PoolConfig::for_testing(),
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new().rejecting_verify("bad"),
            MockLedger::new(),
        );

        t.pool
            .process_unconfirmed_transaction(bundled_tx("bad"), false)
            .await
            .unwrap();
        t.pool
            .process_unconfirmed_transaction(bundled_tx("good"), false)
            .await
            .unwrap();

        t.pool.process_bundled().await;

        // The bad entry left the bundled queue and was staged nowhere.
        assert!(!t.pool.transaction_in_pool("bad"));
        assert!(t.pool.get_queued_transaction("good").is_some());
    }

    // =========================================================================
    // EXPIRY
    // =========================================================================

    #[tokio::test]
    async fn test_expiry_honors_per_class_time_to_live() {
        let t = default_harness(); // 60 s base timeout

        t.pool.queue_transaction(plain_tx("plain")).unwrap();
        t.pool.queue_transaction(signed_tx("signed")).unwrap();
        t.pool.queue_transaction(registration_tx("reg", 1)).unwrap();
        t.pool
            .add_unconfirmed_transaction(pooled(plain_tx("applied")));

        // Just past the base timeout only the plain entries fall.
        t.clock.advance(60_000 + 1);
        let expired = t.pool.expire_transactions();
        assert_eq!(expired, ["applied".to_string(), "plain".to_string()]);
        assert!(t.pool.transaction_in_pool("signed"));
        assert!(t.pool.transaction_in_pool("reg"));

        // Signature-bearing entries live eight times as long.
        t.clock.advance(8 * 60_000 - 60_000);
        let expired = t.pool.expire_transactions();
        assert_eq!(expired, ["signed".to_string()]);
        assert!(t.pool.transaction_in_pool("reg"));

        // The registration expires only after its declared hour; exactly at
        // the boundary it still lives.
        t.clock.advance(3_600_000 - (8 * 60_000 + 1));
        assert!(t.pool.expire_transactions().is_empty());
        t.clock.advance(1);
        assert_eq!(t.pool.expire_transactions(), ["reg".to_string()]);
        assert_eq!(t.pool.count_multisignature(), 0);
    }

    #[tokio::test]
    async fn test_bundled_entries_never_expire() {
        let t = default_harness();

        t.pool
            .process_unconfirmed_transaction(bundled_tx("B"), false)
            .await
            .unwrap();

        t.clock.advance(100 * 3_600_000);
        assert!(t.pool.expire_transactions().is_empty());
        assert_eq!(t.pool.count_bundled(), 1);
    }

    // =========================================================================
    // FILL / APPLY / UNDO
    // =========================================================================

    #[tokio::test]
    async fn test_fill_pool_skips_while_syncing() {
        let t = default_harness();
        t.pool.queue_transaction(plain_tx("a")).unwrap();
        t.loader.set_syncing(true);

        t.pool.fill_pool().await;

        assert_eq!(t.pool.count_unconfirmed(), 0);
        assert_eq!(t.pool.count_queued(), 1);
    }

    #[tokio::test]
    async fn test_fill_pool_skips_when_unconfirmed_full() {
        let config = PoolConfig {
            max_txs_per_block: 2,
            ..PoolConfig::for_testing()
        };
        let t = harness(
            config,
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new(),
            MockLedger::new(),
        );

        t.pool.add_unconfirmed_transaction(pooled(plain_tx("u1")));
        t.pool.add_unconfirmed_transaction(pooled(plain_tx("u2")));
        t.pool.queue_transaction(plain_tx("q")).unwrap();

        t.pool.fill_pool().await;

        assert_eq!(t.pool.count_unconfirmed(), 2);
        assert_eq!(t.pool.count_queued(), 1);
        assert!(t.ledger.applied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fill_pool_selects_multisig_quota_plus_queued() {
        let config = PoolConfig {
            max_txs_per_queue: 200,
            ..PoolConfig::for_testing() // 25 per block
        };
        let t = harness(
            config,
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new(),
            MockLedger::new(),
        );

        for i in 0..10 {
            t.pool
                .queue_transaction(ready_multisig_tx(&format!("m{i}")))
                .unwrap();
        }
        for i in 0..100 {
            t.pool.queue_transaction(plain_tx(&format!("q{i}"))).unwrap();
        }

        t.pool.fill_pool().await;

        // Five multisignature slots, the remaining twenty from the queue.
        assert_eq!(t.pool.count_unconfirmed(), 25);
        assert_eq!(t.pool.count_multisignature(), 5);
        assert_eq!(t.pool.count_queued(), 80);
        assert_eq!(t.ledger.applied.lock().unwrap().len(), 25);
    }

    #[tokio::test]
    async fn test_fill_pool_skips_multisig_when_spare_is_small() {
        let config = PoolConfig {
            max_txs_per_block: 4,
            ..PoolConfig::for_testing()
        };
        let t = harness(
            config,
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new(),
            MockLedger::new(),
        );

        t.pool.queue_transaction(ready_multisig_tx("m1")).unwrap();
        t.pool.queue_transaction(ready_multisig_tx("m2")).unwrap();
        for i in 0..10 {
            t.pool.queue_transaction(plain_tx(&format!("q{i}"))).unwrap();
        }

        t.pool.fill_pool().await;

        // A spare below the quota leaves multisignature entries alone.
        assert_eq!(t.pool.count_unconfirmed(), 4);
        assert_eq!(t.pool.count_multisignature(), 2);
        assert_eq!(t.pool.count_queued(), 6);
    }

    #[tokio::test]
    async fn test_fill_pool_ignores_unready_multisig() {
        let t = default_harness();

        t.pool.queue_transaction(signed_tx("pending")).unwrap();
        t.pool.queue_transaction(ready_multisig_tx("ready")).unwrap();

        t.pool.fill_pool().await;

        assert!(t.pool.get_unconfirmed_transaction("ready").is_some());
        assert!(t.pool.get_multisignature_transaction("pending").is_some());
    }

    #[tokio::test]
    async fn test_fill_pool_drops_entries_failing_verification() {
        let t = harness(
            PoolConfig::for_testing(),
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new().rejecting_verify("bad"),
            MockLedger::new(),
        );

        t.pool.queue_transaction(plain_tx("bad")).unwrap();
        t.pool.queue_transaction(plain_tx("good")).unwrap();

        t.pool.fill_pool().await;

        assert!(t.pool.get_unconfirmed_transaction("good").is_some());
        assert!(!t.pool.transaction_in_pool("bad"));
        assert_eq!(*t.ledger.applied.lock().unwrap(), ["good"]);
    }

    #[tokio::test]
    async fn test_fill_pool_drops_entries_failing_apply() {
        let t = harness(
            PoolConfig::for_testing(),
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new(),
            MockLedger::new().failing_apply("heavy"),
        );

        t.pool.queue_transaction(plain_tx("heavy")).unwrap();
        t.pool.queue_transaction(plain_tx("light")).unwrap();

        t.pool.fill_pool().await;

        assert!(t.pool.get_unconfirmed_transaction("light").is_some());
        assert!(!t.pool.transaction_in_pool("heavy"));
    }

    #[tokio::test]
    async fn test_undo_unconfirmed_list_returns_entries_to_queued() {
        let t = harness(
            PoolConfig::for_testing(),
            MockAccounts::new().with_account(sender_account()),
            MockLogic::new(),
            MockLedger::new().failing_undo("T2"),
        );

        t.pool.add_unconfirmed_transaction(pooled(plain_tx("T1")));
        t.pool.add_unconfirmed_transaction(pooled(plain_tx("T2")));

        let ids = t.pool.undo_unconfirmed_list().await;

        assert_eq!(ids, ["T1".to_string(), "T2".to_string()]);
        assert_eq!(t.pool.count_unconfirmed(), 0);
        // The clean undo went back to the queue; the failed one is gone.
        assert!(t.pool.get_queued_transaction("T1").is_some());
        assert!(!t.pool.transaction_in_pool("T2"));
        assert_eq!(*t.ledger.undone.lock().unwrap(), ["T1"]);
    }

    #[tokio::test]
    async fn test_undo_readmits_multisig_entries_to_queued() {
        let t = default_harness();

        t.pool.add_unconfirmed_transaction(pooled(signed_tx("M")));
        let ids = t.pool.undo_unconfirmed_list().await;

        // Undone entries go back to the queued queue regardless of class.
        assert_eq!(ids, ["M".to_string()]);
        assert!(t.pool.get_queued_transaction("M").is_some());
        assert_eq!(t.pool.count_multisignature(), 0);
    }

    // =========================================================================
    // STATUS AND TRAIT SURFACES
    // =========================================================================

    #[tokio::test]
    async fn test_status_snapshot() {
        let t = default_harness();

        t.pool
            .process_unconfirmed_transaction(bundled_tx("b"), false)
            .await
            .unwrap();
        t.pool.queue_transaction(plain_tx("q")).unwrap();
        t.pool.queue_transaction(signed_tx("m")).unwrap();
        t.pool.add_unconfirmed_transaction(pooled(plain_tx("u")));

        let status = t.pool.status();
        assert_eq!(
            status,
            PoolStatus {
                unconfirmed: 1,
                bundled: 1,
                queued: 1,
                multisignature: 1,
            }
        );
        assert_eq!(status.total(), 4);
    }

    #[tokio::test]
    async fn test_driving_ports_are_usable_as_trait_objects() {
        let t = default_harness();
        let ingress: &dyn TransactionIngress = &t.pool;
        let forging: &dyn ForgingApi = &t.pool;

        ingress
            .process_unconfirmed_transaction(plain_tx("A"), false)
            .await
            .unwrap();
        forging.fill_pool().await;

        assert_eq!(t.pool.count_unconfirmed(), 1);
        assert!(forging.expire_transactions().is_empty());
    }
}
