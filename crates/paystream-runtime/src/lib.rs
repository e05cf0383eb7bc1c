//! # Paystream Runtime
//!
//! Host-facing glue around `paystream-core`:
//! - Accrual tickers: fixed-interval, change-gated re-derivation
//! - Entity locks: one plan at a time per entity
//! - Coordinator: composite edits as independent, failure-isolated
//!   member plans
//! - Bootstrap: config-driven construction of the runner and tickers
//!
//! The runtime assumes a cooperative async host (a UI thread or a
//! server runtime); nothing here blocks a shared thread, and all
//! derivations stay pure so a thread-pool host is equally safe.

pub mod bootstrap;
pub mod coordinator;
pub mod locks;
pub mod ticker;

pub use bootstrap::{accrual_ticker, batch_accrual_ticker, saga_runner};
pub use coordinator::{CompositeEdit, Coordinator, EmployeeEdit, EmployeeState};
pub use locks::EntityLocks;
pub use ticker::{
    AccrualTicker, BatchAccrualTicker, DEFAULT_BATCH_TICK_INTERVAL, DEFAULT_TICK_INTERVAL,
};
