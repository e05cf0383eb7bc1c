//! Plan builders
//!
//! Builders diff current against desired entity state and emit a
//! plan whose step shape is fixed by the operation kind. A no-op
//! diff returns `Ok(None)` — mandatory, so callers can disable
//! their submit affordance precisely when nothing would change.
//! Validation failures are returned before any step exists.
//!
//! Rebuilding after a partial failure is the only sanctioned retry
//! path: steps already reflected in current state (a sufficient
//! allowance, an applied rate) fall out of the rebuilt plan.

use crate::error::PlanError;
use crate::types::{EntityId, PlanKind, StepAction, TransactionPlan, WithdrawTarget};

/// Desired salary state for one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalaryTarget {
    /// New salary per period, smallest unit.
    pub rate_per_period: u128,
    /// When streaming at the new rate should start. Ignored when
    /// `start_now` is set.
    pub start_time: i64,
    /// Start streaming immediately instead of at `start_time`.
    pub start_now: bool,
}

/// Build the salary-change plan, the most involved shape.
///
/// Always: prepare, set-salary, finalize. When the rate increases,
/// the delta must be funded first: a deposit step, preceded by an
/// approval step only if `allowance` does not already cover the
/// delta. When the rate decreases, no funding steps are emitted at
/// all — omitted, not included-and-auto-passed.
pub fn build_salary_plan(
    entity: &EntityId,
    current_rate: u128,
    target: &SalaryTarget,
    allowance: u128,
    now: i64,
) -> Result<Option<TransactionPlan>, PlanError> {
    if target.rate_per_period == 0 {
        return Err(PlanError::NonPositiveAmount);
    }
    if !target.start_now && target.start_time <= now {
        return Err(PlanError::StartTimeNotInFuture {
            start_time: target.start_time,
            now,
        });
    }
    if target.rate_per_period == current_rate {
        return Ok(None);
    }

    let mut actions = vec![StepAction::Prepare];
    if target.rate_per_period > current_rate {
        let delta = target.rate_per_period - current_rate;
        if allowance < delta {
            actions.push(StepAction::Approve { amount: delta });
        }
        actions.push(StepAction::Deposit { amount: delta });
    }
    actions.push(StepAction::SetSalary {
        rate_per_period: target.rate_per_period,
        start_time: if target.start_now {
            now
        } else {
            target.start_time
        },
        start_now: target.start_now,
    });
    actions.push(StepAction::Finalize);

    Ok(Some(TransactionPlan::new(
        entity.clone(),
        PlanKind::SalaryChange,
        actions,
    )))
}

/// Build the label-change plan: prepare, set-label, finalize.
pub fn build_label_plan(
    entity: &EntityId,
    current_label: &str,
    desired_label: &str,
) -> Result<Option<TransactionPlan>, PlanError> {
    if desired_label.trim().is_empty() {
        return Err(PlanError::EmptyLabel);
    }
    if desired_label == current_label {
        return Ok(None);
    }

    Ok(Some(TransactionPlan::new(
        entity.clone(),
        PlanKind::LabelChange,
        vec![
            StepAction::Prepare,
            StepAction::SetLabel {
                label: desired_label.to_string(),
            },
            StepAction::Finalize,
        ],
    )))
}

/// Build the status-change plan: prepare, set-active, finalize.
pub fn build_status_plan(
    entity: &EntityId,
    current_active: bool,
    desired_active: bool,
) -> Result<Option<TransactionPlan>, PlanError> {
    if desired_active == current_active {
        return Ok(None);
    }

    Ok(Some(TransactionPlan::new(
        entity.clone(),
        PlanKind::StatusChange,
        vec![
            StepAction::Prepare,
            StepAction::SetActive {
                active: desired_active,
            },
            StepAction::Finalize,
        ],
    )))
}

/// Build the organization-creation plan: prepare, create, finalize.
/// Creation is not a diff: it always produces a plan, provided the
/// label and token are present.
pub fn build_create_organization_plan(
    entity: &EntityId,
    label: &str,
    token: &str,
) -> Result<TransactionPlan, PlanError> {
    if label.trim().is_empty() {
        return Err(PlanError::EmptyLabel);
    }
    if token.trim().is_empty() {
        return Err(PlanError::EmptyToken);
    }

    Ok(TransactionPlan::new(
        entity.clone(),
        PlanKind::OrganizationCreate,
        vec![
            StepAction::Prepare,
            StepAction::CreateOrganization {
                label: label.to_string(),
                token: token.to_string(),
            },
            StepAction::Finalize,
        ],
    ))
}

/// Build the organization-deposit plan: prepare, approve when the
/// allowance falls short, deposit, finalize.
pub fn build_deposit_plan(
    entity: &EntityId,
    amount: u128,
    allowance: u128,
) -> Result<TransactionPlan, PlanError> {
    if amount == 0 {
        return Err(PlanError::NonPositiveAmount);
    }

    let mut actions = vec![StepAction::Prepare];
    if allowance < amount {
        actions.push(StepAction::Approve { amount });
    }
    actions.push(StepAction::Deposit { amount });
    actions.push(StepAction::Finalize);

    Ok(TransactionPlan::new(
        entity.clone(),
        PlanKind::AccountDeposit,
        actions,
    ))
}

/// Build the withdraw plan: prepare, withdraw, finalize. The amount
/// is validated against the derived available balance.
pub fn build_withdraw_plan(
    entity: &EntityId,
    amount: u128,
    available: u128,
) -> Result<TransactionPlan, PlanError> {
    if amount == 0 {
        return Err(PlanError::NonPositiveAmount);
    }
    if amount > available {
        return Err(PlanError::InsufficientAvailable {
            requested: amount,
            available,
        });
    }

    Ok(TransactionPlan::new(
        entity.clone(),
        PlanKind::Withdrawal,
        vec![
            StepAction::Prepare,
            StepAction::Withdraw {
                amount,
                target: WithdrawTarget::Organization,
            },
            StepAction::Finalize,
        ],
    ))
}

/// Build the protocol-withdraw plan: prepare, withdraw, finalize.
/// Same shape as the employee withdrawal, but the funds come out of
/// the yield position, so the amount is checked against the staked
/// balance instead of accrued salary.
pub fn build_protocol_withdraw_plan(
    entity: &EntityId,
    amount: u128,
    staked: u128,
) -> Result<TransactionPlan, PlanError> {
    if amount == 0 {
        return Err(PlanError::NonPositiveAmount);
    }
    if amount > staked {
        return Err(PlanError::InsufficientAvailable {
            requested: amount,
            available: staked,
        });
    }

    Ok(TransactionPlan::new(
        entity.clone(),
        PlanKind::ProtocolWithdrawal,
        vec![
            StepAction::Prepare,
            StepAction::Withdraw {
                amount,
                target: WithdrawTarget::Protocol,
            },
            StepAction::Finalize,
        ],
    ))
}
