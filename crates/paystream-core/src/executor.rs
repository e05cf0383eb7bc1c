//! Boundary traits to the external ledger
//!
//! The core consumes exactly two submit-side primitives from
//! surrounding code: a readiness probe and a submit-and-confirm
//! call. Everything else about the ledger (signing, wallets,
//! networks) lives on the other side of these traits.

use async_trait::async_trait;

use crate::types::{EntityId, StepAction, StreamSnapshot};

/// Outcome of submitting one action to the external ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The action was confirmed, optionally with a reference
    /// identifier the caller can use for external verification.
    Confirmed { reference: Option<String> },
    /// The action was rejected: user declined, the call reverted,
    /// or the network failed. The message is surfaced verbatim.
    Rejected { message: String },
}

impl SubmitOutcome {
    pub fn confirmed(reference: impl Into<String>) -> Self {
        Self::Confirmed {
            reference: Some(reference.into()),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Submits action descriptors to the external ledger and waits for
/// confirmation. One call per step; the executor is responsible for
/// bounding how long it waits — the core enforces no timeout of its
/// own, so a perpetually pending submit keeps the plan Running.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Precondition probe, called once before the first step runs.
    /// An error here fails the plan with zero steps attempted.
    async fn check_ready(&self) -> Result<(), String>;

    /// Submit one action and wait for its confirmation outcome.
    async fn submit(&self, entity: &EntityId, action: &StepAction) -> SubmitOutcome;
}

/// Read-side primitive for the employer's current token allowance
/// toward the organization, used at plan-build time to decide
/// whether an approval step is needed at all.
#[async_trait]
pub trait AllowanceSource: Send + Sync {
    async fn allowance(&self) -> u128;
}

/// Read-side primitive for the last known stream state of an entity.
/// Reads may be stale; the accrual engine tolerates that and simply
/// reports larger elapsed time.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn read(&self, entity: &EntityId) -> Result<StreamSnapshot, String>;
}
