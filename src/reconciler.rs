use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::{error, info};

use crate::bookings::BookingStore;
use crate::clock::Clock;

/// Outcome of one reconciliation pass. With no intervening clock change a
/// second pass affects zero rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePass {
    pub promoted: u64,
    pub demoted: u64,
}

impl ReconcilePass {
    pub fn changed(&self) -> u64 {
        self.promoted + self.demoted
    }
}

/// Background worker re-deriving booking statuses against the clock:
/// Active bookings past their end become Overdue, and Overdue bookings
/// whose end moved ahead of the clock again return to Active.
pub struct Reconciler {
    bookings: BookingStore,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl Reconciler {
    pub fn new(bookings: BookingStore, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            bookings,
            clock,
            interval,
        }
    }

    pub async fn run(&self) {
        info!("Starting status reconciler");

        loop {
            match self.reconcile_once().await {
                Ok(pass) if pass.changed() > 0 => {
                    info!(
                        promoted = pass.promoted,
                        demoted = pass.demoted,
                        "reconciled booking statuses"
                    );
                }
                Ok(_) => {}
                // best effort; the next tick retries
                Err(err) => error!("status reconciliation failed: {}", err),
            }

            sleep(self.interval).await;
        }
    }

    /// One pass of the two batched conditional updates. Concurrent
    /// reconcilers are expected; last write wins at the store.
    pub async fn reconcile_once(&self) -> Result<ReconcilePass> {
        let now = self.clock.now();
        let promoted = self.bookings.mark_overdue(now.date(), now.time()).await?;
        let demoted = self.bookings.unmark_overdue(now.date(), now.time()).await?;
        Ok(ReconcilePass { promoted, demoted })
    }
}
