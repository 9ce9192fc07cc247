//! Append-only transaction queue with soft deletion.
//!
//! Each queue is an ordered sequence of slots plus an id → position index.
//! Insertion appends, removal tombstones the slot and unmaps the id, and a
//! periodic reindex drops the tombstones and rebuilds the index. Removal is
//! O(1), snapshots are O(n), and positions held by in-flight snapshots keep
//! pointing at stable slots until the next compaction.

use super::entities::PooledTransaction;
use shared_types::TransactionId;
use std::collections::HashMap;

/// One staging queue of the pool.
///
/// Index consistency: `index[id] = k` implies `slots[k]` holds the live
/// transaction with that id; tombstoned slots have no index entry.
#[derive(Debug, Default)]
pub struct TransactionQueue {
    /// Ordered slots; `None` marks a tombstone awaiting compaction.
    slots: Vec<Option<PooledTransaction>>,
    /// Position of each live transaction id.
    index: HashMap<TransactionId, usize>,
}

impl TransactionQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Adding an id that is already indexed is a silent
    /// no-op.
    pub fn add(&mut self, entry: PooledTransaction) {
        if self.index.contains_key(entry.id()) {
            return;
        }
        let position = self.slots.len();
        self.index.insert(entry.id().clone(), position);
        self.slots.push(Some(entry));
    }

    /// Tombstone the slot holding `id` and unmap it, returning the entry.
    /// Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &str) -> Option<PooledTransaction> {
        let position = self.index.remove(id)?;
        self.slots[position].take()
    }

    /// The live entry for `id`, if any.
    pub fn get(&self, id: &str) -> Option<&PooledTransaction> {
        self.index
            .get(id)
            .and_then(|&position| self.slots[position].as_ref())
    }

    /// Whether `id` is indexed.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of live entries.
    pub fn count(&self) -> usize {
        self.index.len()
    }

    /// Raw slot length, tombstones included.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Snapshot of the live entries in insertion order, reversed first when
    /// requested, then truncated to `limit` (`0` meaning no limit).
    pub fn list(&self, reverse: bool, limit: usize) -> Vec<PooledTransaction> {
        let mut snapshot: Vec<PooledTransaction> = self.slots.iter().flatten().cloned().collect();
        if reverse {
            snapshot.reverse();
        }
        if limit > 0 {
            snapshot.truncate(limit);
        }
        snapshot
    }

    /// Drop tombstones and rebuild the index from the compacted sequence.
    pub fn reindex(&mut self) {
        self.slots.retain(Option::is_some);
        self.index.clear();
        for (position, slot) in self.slots.iter().enumerate() {
            if let Some(entry) = slot {
                self.index.insert(entry.id().clone(), position);
            }
        }
    }
}
