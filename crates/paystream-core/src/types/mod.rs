//! Core type definitions for paystream
//!
//! This module contains the fundamental types used throughout the
//! system:
//! - StreamSnapshot: cached ledger state for one employee stream
//! - Step: individual external action with a status lifecycle
//! - TransactionPlan: ordered steps executed as one session

mod plan;
mod snapshot;
mod step;

pub use plan::{PlanKind, PlanStatus, TransactionPlan};
pub use snapshot::{
    EntityId, RawStreamSnapshot, StreamSnapshot, PERIOD_DAILY, PERIOD_MONTHLY, PERIOD_WEEKLY,
    PERIOD_YEARLY,
};
pub use step::{Step, StepAction, StepStatus, WithdrawTarget};
