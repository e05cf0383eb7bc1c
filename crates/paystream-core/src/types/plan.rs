//! Transaction plan types
//!
//! A plan is an ordered list of steps computed from a diff between
//! current and desired entity state, together with an aggregate
//! session status. Plans are immutable values from the caller's
//! point of view: the saga runner replaces the whole plan on every
//! transition and publishes the new snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::EntityId;
use super::step::{Step, StepAction, StepStatus};

/// The operation kind a plan performs. Each kind has a fixed,
/// statically-known step shape chosen by the plan builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    OrganizationCreate,
    SalaryChange,
    LabelChange,
    StatusChange,
    AccountDeposit,
    Withdrawal,
    ProtocolWithdrawal,
}

impl PlanKind {
    /// Display name for the session, rendered as the dialog title.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlanKind::OrganizationCreate => "Create organization",
            PlanKind::SalaryChange => "Update employee salary",
            PlanKind::LabelChange => "Update employee label",
            PlanKind::StatusChange => "Update employee status",
            PlanKind::AccountDeposit => "Deposit to organization",
            PlanKind::Withdrawal => "Withdraw funds",
            PlanKind::ProtocolWithdrawal => "Withdraw from protocol",
        }
    }
}

/// Aggregate session status.
///
/// Running iff at least one step is Running; Succeeded iff all steps
/// are Succeeded; Failed iff any step is Failed (or the session was
/// rejected before its first step started).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl PlanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Succeeded | PlanStatus::Failed)
    }
}

/// An ordered sequence of steps executed as one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPlan {
    /// Unique session identifier.
    pub id: String,
    /// The entity this plan mutates.
    pub entity_id: EntityId,
    /// Operation kind; fixes the step shape.
    pub kind: PlanKind,
    /// Display name for the session.
    pub label: String,
    /// Ordered steps; indexes are 1-based and fixed at build time.
    pub steps: Vec<Step>,
    /// Aggregate session status.
    pub status: PlanStatus,
    /// Confirmation identifier of the last successful external step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_reference: Option<String>,
    /// Session-level error for failures before the first step ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionPlan {
    /// Create an idle plan from build-time actions. Step indexes are
    /// assigned here, 1-based, in execution order.
    pub fn new(entity_id: EntityId, kind: PlanKind, actions: Vec<StepAction>) -> Self {
        let now = Utc::now();
        let steps = actions
            .into_iter()
            .enumerate()
            .map(|(i, action)| Step::new(i as u32 + 1, action))
            .collect();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entity_id,
            kind,
            label: kind.display_name().to_string(),
            steps,
            status: PlanStatus::Idle,
            result_reference: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the session reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether any step has started running. A plan may only be
    /// abandoned before this becomes true or after it is terminal.
    pub fn has_started(&self) -> bool {
        self.steps.iter().any(|s| s.status != StepStatus::Idle)
    }

    /// The first failed step, if any.
    pub fn failed_step(&self) -> Option<&Step> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }

    /// Transition a step to Running.
    pub(crate) fn start_step(&mut self, position: usize) {
        if let Some(step) = self.steps.get_mut(position) {
            step.status = StepStatus::Running;
        }
        self.recompute_status();
    }

    /// Transition a step to Succeeded, recording its confirmation
    /// reference as the session's result reference when present.
    pub(crate) fn succeed_step(&mut self, position: usize, reference: Option<String>) {
        if let Some(step) = self.steps.get_mut(position) {
            step.status = StepStatus::Succeeded;
        }
        if reference.is_some() {
            self.result_reference = reference;
        }
        self.recompute_status();
    }

    /// Transition a step to Failed with its captured error detail.
    pub(crate) fn fail_step(&mut self, position: usize, detail: impl Into<String>) {
        if let Some(step) = self.steps.get_mut(position) {
            step.status = StepStatus::Failed;
            step.error_detail = Some(detail.into());
        }
        self.recompute_status();
    }

    /// Fail the whole session before any step ran (precondition
    /// rejection). All steps remain Idle.
    pub(crate) fn fail_before_start(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
        self.status = PlanStatus::Failed;
        self.updated_at = Utc::now();
    }

    fn recompute_status(&mut self) {
        self.status = if self.steps.iter().any(|s| s.status == StepStatus::Failed) {
            PlanStatus::Failed
        } else if self.steps.iter().any(|s| s.status == StepStatus::Running) {
            PlanStatus::Running
        } else if !self.steps.is_empty()
            && self.steps.iter().all(|s| s.status == StepStatus::Succeeded)
        {
            PlanStatus::Succeeded
        } else if self.has_started() {
            // Partway through, between steps.
            PlanStatus::Running
        } else {
            PlanStatus::Idle
        };
        self.updated_at = Utc::now();
    }
}
