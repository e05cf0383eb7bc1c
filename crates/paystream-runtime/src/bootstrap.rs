//! Config-driven construction
//!
//! Maps the `paystream.yaml` schema onto the runtime's building
//! blocks, so hosts construct everything from a single loaded
//! config instead of hand-converting millisecond fields.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::watch;

use paystream_config::PaystreamConfig;
use paystream_core::saga::SagaRunner;
use paystream_core::types::{EntityId, StreamSnapshot};

use crate::ticker::{AccrualTicker, BatchAccrualTicker};

/// Build a saga runner with the configured finalize settle delay.
pub fn saga_runner(config: &PaystreamConfig) -> SagaRunner {
    SagaRunner::new().with_settle_delay(Duration::from_millis(config.saga.finalize_settle_ms))
}

/// Build a single-entity accrual ticker on the configured interval.
pub fn accrual_ticker(
    config: &PaystreamConfig,
    snapshot_rx: watch::Receiver<StreamSnapshot>,
) -> AccrualTicker {
    AccrualTicker::with_interval(
        snapshot_rx,
        Duration::from_millis(config.accrual.tick_interval_ms),
    )
}

/// Build a batch accrual ticker on the configured batch interval.
pub fn batch_accrual_ticker(
    config: &PaystreamConfig,
    snapshots_rx: watch::Receiver<HashMap<EntityId, StreamSnapshot>>,
) -> BatchAccrualTicker {
    BatchAccrualTicker::with_interval(
        snapshots_rx,
        Duration::from_millis(config.accrual.batch_tick_interval_ms),
    )
}
