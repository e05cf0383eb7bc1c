//! Error taxonomy for plan building and execution.
//!
//! Validation and precondition errors are returned, not thrown past
//! the plan boundary, so callers can render them as form state.
//! External rejections never appear here: they are captured on the
//! failing step inside the plan itself.

use thiserror::Error;

use crate::types::EntityId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanError {
    /// Rejected synchronously by the plan builder.
    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("start time {start_time} is not after current time {now}")]
    StartTimeNotInFuture { start_time: i64, now: i64 },

    #[error("label must not be empty")]
    EmptyLabel,

    #[error("token must not be empty")]
    EmptyToken,

    #[error("withdraw amount {requested} exceeds available balance {available}")]
    InsufficientAvailable { requested: u128, available: u128 },

    /// A plan for this entity has a non-terminal status; the caller
    /// must wait for it before starting another.
    #[error("a plan for entity {0} is already in flight")]
    EntityBusy(EntityId),
}
