//! Step type definitions
//!
//! A Step is one unit of an orchestrated plan: a single external
//! action with an explicit status lifecycle.

use serde::{Deserialize, Serialize};

/// Step status lifecycle: Idle -> Running -> {Succeeded | Failed}.
/// Terminal once Succeeded or Failed; a step never re-enters Running
/// without a fresh plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Succeeded | StepStatus::Failed)
    }
}

/// Where a withdrawal pulls funds from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawTarget {
    /// Accrued salary held by the organization contract.
    Organization,
    /// A yield-bearing protocol position.
    Protocol,
}

/// Descriptor for the external (or local) action a step performs.
///
/// Descriptors are opaque to the saga runner; the action executor
/// interprets them. `Prepare` and `Finalize` are local steps that
/// never reach the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepAction {
    /// Local session setup; no external call.
    Prepare,
    /// Register a new organization on the factory contract.
    CreateOrganization { label: String, token: String },
    /// Raise the token allowance granted to the organization.
    Approve { amount: u128 },
    /// Deposit funds into the organization account.
    Deposit { amount: u128 },
    /// Mutate the employee's salary rate on the organization contract.
    SetSalary {
        rate_per_period: u128,
        start_time: i64,
        start_now: bool,
    },
    /// Mutate the employee's display label.
    SetLabel { label: String },
    /// Mutate the employee's activation status.
    SetActive { active: bool },
    /// Withdraw funds to the employee.
    Withdraw { amount: u128, target: WithdrawTarget },
    /// Local UI settling point; no external call.
    Finalize,
}

impl StepAction {
    /// Whether this step executes locally, without the executor.
    pub fn is_local(&self) -> bool {
        matches!(self, StepAction::Prepare | StepAction::Finalize)
    }

    /// Human-readable step text, rendered next to the step.
    pub fn describe(&self) -> &'static str {
        match self {
            StepAction::Prepare => "Preparing transaction",
            StepAction::CreateOrganization { .. } => "Creating organization",
            StepAction::Approve { .. } => "Approving token",
            StepAction::Deposit { .. } => "Depositing additional token",
            StepAction::SetSalary { .. } => "Updating employee salary",
            StepAction::SetLabel { .. } => "Updating employee label",
            StepAction::SetActive { .. } => "Updating employee status",
            StepAction::Withdraw {
                target: WithdrawTarget::Organization,
                ..
            } => "Withdrawing funds",
            StepAction::Withdraw {
                target: WithdrawTarget::Protocol,
                ..
            } => "Withdrawing from protocol",
            StepAction::Finalize => "Finalizing",
        }
    }
}

/// A single step within a transaction plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based ordinal, fixed at plan-build time.
    pub index: u32,
    /// Display text for this step.
    pub description: String,
    /// The action this step performs.
    pub action: StepAction,
    /// Current lifecycle status.
    pub status: StepStatus,
    /// Captured error message; present only when Failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl Step {
    /// Create an idle step; the index is assigned by the plan.
    pub fn new(index: u32, action: StepAction) -> Self {
        Self {
            index,
            description: action.describe().to_string(),
            action,
            status: StepStatus::Idle,
            error_detail: None,
        }
    }
}
