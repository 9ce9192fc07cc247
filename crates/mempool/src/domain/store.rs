//! The four named queues and the admission counter.

use super::entities::{QueueKind, REINDEX_THRESHOLD};
use super::queue::TransactionQueue;

/// Owns the pool's queues and the compaction counter.
///
/// All mutation happens behind the service's lock; compaction therefore
/// cannot interleave with a snapshot taken under the same lock.
#[derive(Debug, Default)]
pub struct QueueStore {
    /// Verified and applied, awaiting block inclusion.
    pub unconfirmed: TransactionQueue,
    /// Deferred to the next bundle tick.
    pub bundled: TransactionQueue,
    /// Verified, waiting for block-fill selection.
    pub queued: TransactionQueue,
    /// Waiting for a signature group to complete.
    pub multisignature: TransactionQueue,
    /// Successful admissions since the last compaction.
    processed: u64,
}

impl QueueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The queue for `kind`.
    pub fn queue(&self, kind: QueueKind) -> &TransactionQueue {
        match kind {
            QueueKind::Unconfirmed => &self.unconfirmed,
            QueueKind::Bundled => &self.bundled,
            QueueKind::Queued => &self.queued,
            QueueKind::Multisignature => &self.multisignature,
        }
    }

    /// Mutable access to the queue for `kind`.
    pub fn queue_mut(&mut self, kind: QueueKind) -> &mut TransactionQueue {
        match kind {
            QueueKind::Unconfirmed => &mut self.unconfirmed,
            QueueKind::Bundled => &mut self.bundled,
            QueueKind::Queued => &mut self.queued,
            QueueKind::Multisignature => &mut self.multisignature,
        }
    }

    /// Whether `id` is indexed by any of the four queues.
    pub fn in_pool(&self, id: &str) -> bool {
        self.unconfirmed.contains(id)
            || self.bundled.contains(id)
            || self.queued.contains(id)
            || self.multisignature.contains(id)
    }

    /// Count one admission. Past the compaction threshold every queue is
    /// reindexed and the counter restarts at 1. Returns whether a
    /// compaction ran.
    pub fn note_processed(&mut self) -> bool {
        self.processed += 1;
        if self.processed > REINDEX_THRESHOLD {
            self.reindex_all();
            self.processed = 1;
            return true;
        }
        false
    }

    /// Admissions counted since the last compaction.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Compact every queue.
    pub fn reindex_all(&mut self) {
        self.unconfirmed.reindex();
        self.bundled.reindex();
        self.queued.reindex();
        self.multisignature.reindex();
    }
}
