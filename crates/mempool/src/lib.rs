//! # Transaction Pool
//!
//! In-memory admission, verification, and staging for candidate
//! transactions. Sits between the network receiver and the block producer:
//! peers and local clients feed transactions in, the pool classifies them
//! into four queues, verifies them against account state, expires stale
//! entries, and surfaces a ready-to-forge slice when the next block is
//! assembled.
//!
//! ## Queues
//!
//! | Queue | Holds |
//! |-------|-------|
//! | `bundled` | Entries deferred to the next bundle tick for batched verification |
//! | `queued` | Verified entries waiting for block-fill selection |
//! | `multisignature` | Entries waiting for a signature group to complete |
//! | `unconfirmed` | Verified and applied entries awaiting block inclusion |
//!
//! ## Lifecycle
//!
//! ```text
//! received ──→ [bundled] ──→ verified ──→ [queued | multisignature]
//!                                               │
//!                                        fill-pool selection
//!                                               ▼
//!                                         [unconfirmed]
//!                                               │
//!                    block applied / expired / undone / rejected
//! ```
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  adapters/  - Event bus publisher implementations               │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ports/inbound.rs  - TransactionIngress, ForgingApi             │
//! │  ports/outbound.rs - AccountProvider, TransactionLogic,         │
//! │                      UnconfirmedLedger, ChainLoader, TimeSource │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  domain/entities.rs - PooledTransaction, TransactionClass,      │
//! │                       PoolConfig                                │
//! │  domain/queue.rs    - TransactionQueue (slots + id index)       │
//! │  domain/store.rs    - QueueStore (four queues + compaction)     │
//! │  domain/errors.rs   - PoolError                                 │
//! │  service.rs         - TransactionPool                           │
//! │  jobs.rs            - PoolJobs (bundle drain, expiry sweep)     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! Queue state lives behind a single `RwLock`; collaborator calls are the
//! only suspension points and run with the lock released. Periodic jobs
//! never overlap themselves: a tick finishes before the next one starts.

pub mod adapters;
pub mod domain;
pub mod jobs;
pub mod ports;
pub mod service;

pub use adapters::{BusPublisher, NoOpPublisher, PoolEventPublisher};
pub use domain::{
    PoolConfig, PoolError, PoolStatus, PooledTransaction, QueueKind, Transaction, TransactionClass,
    TransactionId,
};
pub use jobs::PoolJobs;
pub use ports::inbound::{ForgingApi, TransactionIngress};
pub use ports::outbound::{
    AccountProvider, ChainLoader, SystemTimeSource, TimeSource, TransactionLogic,
    UnconfirmedLedger,
};
pub use service::TransactionPool;
