//! Periodic jobs of the transaction pool.
//!
//! Two recurring jobs keep the pool moving: the bundle drain and the expiry
//! sweep. Each runs on its own spawned task, and a tick runs to completion
//! before the task awaits the next interval, so a job never overlaps
//! itself. The two jobs are independent and may interleave.

use crate::domain::EXPIRY_INTERVAL_MS;
use crate::ports::outbound::{AccountProvider, ChainLoader, TransactionLogic, UnconfirmedLedger};
use crate::service::TransactionPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Handles to the pool's spawned periodic jobs.
///
/// Dropping the handles does not stop the jobs; call [`PoolJobs::shutdown`]
/// to abort them.
pub struct PoolJobs {
    bundle: JoinHandle<()>,
    expiry: JoinHandle<()>,
}

impl PoolJobs {
    /// Spawn the bundle-drain and expiry jobs for `pool`.
    pub fn spawn<A, L, W, C>(pool: Arc<TransactionPool<A, L, W, C>>) -> Self
    where
        A: AccountProvider + 'static,
        L: TransactionLogic + 'static,
        W: UnconfirmedLedger + 'static,
        C: ChainLoader + 'static,
    {
        info!(
            bundle_interval_ms = pool.config().broadcast_interval_ms,
            expiry_interval_ms = EXPIRY_INTERVAL_MS,
            "Starting transaction pool jobs"
        );

        let bundle = tokio::spawn({
            let pool = Arc::clone(&pool);
            let period = Duration::from_millis(pool.config().broadcast_interval_ms);
            async move {
                let mut interval = tokio::time::interval(period);
                loop {
                    interval.tick().await;
                    pool.process_bundled().await;
                }
            }
        });

        let expiry = tokio::spawn({
            let pool = Arc::clone(&pool);
            async move {
                let mut interval = tokio::time::interval(Duration::from_millis(EXPIRY_INTERVAL_MS));
                loop {
                    interval.tick().await;
                    let expired = pool.expire_transactions();
                    if !expired.is_empty() {
                        debug!(count = expired.len(), "Expiry sweep dropped transactions");
                    }
                }
            }
        });

        Self { bundle, expiry }
    }

    /// Abort both jobs.
    pub fn shutdown(self) {
        self.bundle.abort();
        self.expiry.abort();
    }
}
