//! Accrual tickers
//!
//! Periodic re-derivation of accrual results from cached snapshots.
//! A tick performs no I/O: it reads the latest snapshot from a
//! `watch` channel, derives, and publishes only when at least one
//! output field changed — redundant ticks are invisible to
//! subscribers, so batch consumers do not re-render needlessly.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use paystream_core::accrual::{derive_accrual, AccrualResult};
use paystream_core::types::{EntityId, StreamSnapshot};

/// Default re-derivation interval for a single entity.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
/// Default re-derivation interval when evaluating many entities.
pub const DEFAULT_BATCH_TICK_INTERVAL: Duration = Duration::from_secs(2);

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Periodic accrual derivation for one entity.
///
/// Snapshot refreshes arrive on the input channel from whoever
/// talks to the indexer; ticks between refreshes simply see a
/// larger elapsed time.
pub struct AccrualTicker {
    snapshot_rx: watch::Receiver<StreamSnapshot>,
    interval: Duration,
    tx: watch::Sender<AccrualResult>,
    cancel: CancellationToken,
}

impl AccrualTicker {
    pub fn new(snapshot_rx: watch::Receiver<StreamSnapshot>) -> Self {
        Self::with_interval(snapshot_rx, DEFAULT_TICK_INTERVAL)
    }

    pub fn with_interval(
        snapshot_rx: watch::Receiver<StreamSnapshot>,
        interval: Duration,
    ) -> Self {
        let initial = derive_accrual(&snapshot_rx.borrow(), unix_now());
        let (tx, _) = watch::channel(initial);
        Self {
            snapshot_rx,
            interval,
            tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Subscribe to derived results. The current value is always the
    /// latest published derivation.
    pub fn subscribe(&self) -> watch::Receiver<AccrualResult> {
        self.tx.subscribe()
    }

    /// The configured re-derivation interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Token that stops the tick loop when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drive the tick loop until cancelled. Spawn this on the host's
    /// runtime; the loop itself never blocks a shared thread.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!("accrual ticker stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let snapshot = self.snapshot_rx.borrow().clone();
                    let next = derive_accrual(&snapshot, unix_now());
                    self.tx.send_if_modified(|current| {
                        if *current == next {
                            false
                        } else {
                            *current = next;
                            true
                        }
                    });
                }
            }
        }
    }
}

/// Periodic accrual derivation for a set of entities, re-deriving
/// the whole map on a single (longer) interval.
pub struct BatchAccrualTicker {
    snapshots_rx: watch::Receiver<HashMap<EntityId, StreamSnapshot>>,
    interval: Duration,
    tx: watch::Sender<HashMap<EntityId, AccrualResult>>,
    cancel: CancellationToken,
}

impl BatchAccrualTicker {
    pub fn new(snapshots_rx: watch::Receiver<HashMap<EntityId, StreamSnapshot>>) -> Self {
        Self::with_interval(snapshots_rx, DEFAULT_BATCH_TICK_INTERVAL)
    }

    pub fn with_interval(
        snapshots_rx: watch::Receiver<HashMap<EntityId, StreamSnapshot>>,
        interval: Duration,
    ) -> Self {
        let now = unix_now();
        let initial = derive_all(&snapshots_rx.borrow(), now);
        let (tx, _) = watch::channel(initial);
        Self {
            snapshots_rx,
            interval,
            tx,
            cancel: CancellationToken::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<HashMap<EntityId, AccrualResult>> {
        self.tx.subscribe()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!("batch accrual ticker stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let snapshots = self.snapshots_rx.borrow().clone();
                    let next = derive_all(&snapshots, unix_now());
                    self.tx.send_if_modified(|current| {
                        if *current == next {
                            false
                        } else {
                            *current = next;
                            true
                        }
                    });
                }
            }
        }
    }
}

fn derive_all(
    snapshots: &HashMap<EntityId, StreamSnapshot>,
    now: i64,
) -> HashMap<EntityId, AccrualResult> {
    snapshots
        .iter()
        .map(|(id, snapshot)| (id.clone(), derive_accrual(snapshot, now)))
        .collect()
}
