//! Multi-plan coordinator
//!
//! A composite edit bundles up to three independent aspects of one
//! employee — label, salary, activation status — under one user
//! action. The coordinator builds one plan per aspect that actually
//! changed, validates every aspect before executing any, then runs
//! the plans sequentially but failure-isolated: one aspect failing
//! never blocks or rolls back the others.

use std::sync::Arc;

use paystream_core::builder::{
    build_create_organization_plan, build_deposit_plan, build_label_plan,
    build_protocol_withdraw_plan, build_salary_plan, build_status_plan, build_withdraw_plan,
    SalaryTarget,
};
use paystream_core::error::PlanError;
use paystream_core::executor::{ActionExecutor, AllowanceSource, SnapshotSource};
use paystream_core::saga::SagaRunner;
use paystream_core::types::{EntityId, PlanStatus, StreamSnapshot, TransactionPlan};

use crate::locks::EntityLocks;

/// Current employee state the coordinator diffs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeState {
    pub label: String,
    pub rate_per_period: u128,
    pub active: bool,
}

/// Desired changes; `None` aspects are left untouched.
#[derive(Debug, Clone, Default)]
pub struct EmployeeEdit {
    pub label: Option<String>,
    pub salary: Option<SalaryTarget>,
    pub active: Option<bool>,
}

impl EmployeeEdit {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.salary.is_none() && self.active.is_none()
    }
}

/// Outcome of one composite edit: the member plans in execution
/// order, plus a refreshed snapshot when any member succeeded.
#[derive(Debug, Clone)]
pub struct CompositeEdit {
    pub plans: Vec<TransactionPlan>,
    pub refreshed: Option<StreamSnapshot>,
}

impl CompositeEdit {
    /// Aggregate status across member plans: Failed if any member
    /// failed, Running if any is still in flight, Succeeded only if
    /// every plan that was built succeeded, Idle when nothing needed
    /// doing.
    pub fn aggregate_status(&self) -> PlanStatus {
        if self.plans.iter().any(|p| p.status == PlanStatus::Failed) {
            PlanStatus::Failed
        } else if self.plans.iter().any(|p| p.status == PlanStatus::Running) {
            PlanStatus::Running
        } else if !self.plans.is_empty()
            && self.plans.iter().all(|p| p.status == PlanStatus::Succeeded)
        {
            PlanStatus::Succeeded
        } else {
            PlanStatus::Idle
        }
    }

    /// Member plans that reached Succeeded.
    pub fn succeeded(&self) -> impl Iterator<Item = &TransactionPlan> {
        self.plans
            .iter()
            .filter(|p| p.status == PlanStatus::Succeeded)
    }
}

/// Runs plans for entities, one at a time per entity.
pub struct Coordinator {
    runner: SagaRunner,
    locks: Arc<EntityLocks>,
    allowance: Arc<dyn AllowanceSource>,
    snapshots: Option<Arc<dyn SnapshotSource>>,
}

impl Coordinator {
    pub fn new(runner: SagaRunner, allowance: Arc<dyn AllowanceSource>) -> Self {
        Self {
            runner,
            locks: Arc::new(EntityLocks::new()),
            allowance,
            snapshots: None,
        }
    }

    /// Share a lock registry with other coordinators.
    pub fn with_locks(mut self, locks: Arc<EntityLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Attach a snapshot source for post-run refreshes.
    pub fn with_snapshot_source(mut self, snapshots: Arc<dyn SnapshotSource>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    /// Run a composite employee edit.
    ///
    /// All aspects are validated and built before any step runs, so
    /// a validation error on one aspect surfaces before the ledger
    /// is touched at all. Execution order is fixed (label, salary,
    /// status) for deterministic progress rendering.
    pub async fn run_composite(
        &self,
        entity: &EntityId,
        current: &EmployeeState,
        edit: &EmployeeEdit,
        executor: &dyn ActionExecutor,
    ) -> Result<CompositeEdit, PlanError> {
        if edit.is_empty() {
            return Ok(CompositeEdit {
                plans: Vec::new(),
                refreshed: None,
            });
        }

        let mut built: Vec<TransactionPlan> = Vec::new();

        if let Some(desired_label) = &edit.label {
            if let Some(plan) = build_label_plan(entity, &current.label, desired_label)? {
                built.push(plan);
            }
        }
        if let Some(target) = &edit.salary {
            let allowance = self.allowance.allowance().await;
            let now = chrono::Utc::now().timestamp();
            if let Some(plan) =
                build_salary_plan(entity, current.rate_per_period, target, allowance, now)?
            {
                built.push(plan);
            }
        }
        if let Some(desired_active) = edit.active {
            if let Some(plan) = build_status_plan(entity, current.active, desired_active)? {
                built.push(plan);
            }
        }

        if built.is_empty() {
            return Ok(CompositeEdit {
                plans: Vec::new(),
                refreshed: None,
            });
        }

        let _guard = self
            .locks
            .try_acquire(entity)
            .await
            .ok_or_else(|| PlanError::EntityBusy(entity.clone()))?;

        let mut plans = Vec::with_capacity(built.len());
        for plan in built {
            let kind = plan.kind;
            let finished = self.runner.run(plan, executor).await;
            if finished.status == PlanStatus::Failed {
                // Isolated: later aspects still get their chance.
                tracing::warn!(
                    entity_id = %entity,
                    plan_kind = ?kind,
                    "composite member plan failed; continuing with remaining aspects"
                );
            }
            plans.push(finished);
        }

        let any_succeeded = plans.iter().any(|p| p.status == PlanStatus::Succeeded);
        let refreshed = if any_succeeded {
            self.refresh(entity).await
        } else {
            None
        };

        Ok(CompositeEdit { plans, refreshed })
    }

    /// Run a standalone salary change for one entity.
    pub async fn run_salary_change(
        &self,
        entity: &EntityId,
        current_rate: u128,
        target: &SalaryTarget,
        executor: &dyn ActionExecutor,
    ) -> Result<Option<TransactionPlan>, PlanError> {
        let allowance = self.allowance.allowance().await;
        let now = chrono::Utc::now().timestamp();
        let Some(plan) = build_salary_plan(entity, current_rate, target, allowance, now)? else {
            return Ok(None);
        };
        self.run_locked(entity, plan, executor).await.map(Some)
    }

    /// Run a deposit into the organization account.
    pub async fn run_deposit(
        &self,
        entity: &EntityId,
        amount: u128,
        executor: &dyn ActionExecutor,
    ) -> Result<TransactionPlan, PlanError> {
        let allowance = self.allowance.allowance().await;
        let plan = build_deposit_plan(entity, amount, allowance)?;
        self.run_locked(entity, plan, executor).await
    }

    /// Run a withdrawal of accrued funds.
    pub async fn run_withdraw(
        &self,
        entity: &EntityId,
        amount: u128,
        available: u128,
        executor: &dyn ActionExecutor,
    ) -> Result<TransactionPlan, PlanError> {
        let plan = build_withdraw_plan(entity, amount, available)?;
        self.run_locked(entity, plan, executor).await
    }

    /// Register a new organization under the given label and token.
    pub async fn run_create_organization(
        &self,
        entity: &EntityId,
        label: &str,
        token: &str,
        executor: &dyn ActionExecutor,
    ) -> Result<TransactionPlan, PlanError> {
        let plan = build_create_organization_plan(entity, label, token)?;
        self.run_locked(entity, plan, executor).await
    }

    /// Run a withdrawal out of the yield position.
    pub async fn run_protocol_withdraw(
        &self,
        entity: &EntityId,
        amount: u128,
        staked: u128,
        executor: &dyn ActionExecutor,
    ) -> Result<TransactionPlan, PlanError> {
        let plan = build_protocol_withdraw_plan(entity, amount, staked)?;
        self.run_locked(entity, plan, executor).await
    }

    async fn run_locked(
        &self,
        entity: &EntityId,
        plan: TransactionPlan,
        executor: &dyn ActionExecutor,
    ) -> Result<TransactionPlan, PlanError> {
        let _guard = self
            .locks
            .try_acquire(entity)
            .await
            .ok_or_else(|| PlanError::EntityBusy(entity.clone()))?;
        Ok(self.runner.run(plan, executor).await)
    }

    /// Re-read the entity's snapshot after a terminal plan so the
    /// accrual view resumes from fresh ledger state.
    async fn refresh(&self, entity: &EntityId) -> Option<StreamSnapshot> {
        let snapshots = self.snapshots.as_ref()?;
        match snapshots.read(entity).await {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(entity_id = %entity, "snapshot refresh failed: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Mutex;

    use paystream_core::executor::SubmitOutcome;
    use paystream_core::types::{StepAction, StreamSnapshot, WithdrawTarget};

    struct FixedAllowance(u128);

    #[async_trait]
    impl AllowanceSource for FixedAllowance {
        async fn allowance(&self) -> u128 {
            self.0
        }
    }

    struct FixedSnapshots(StreamSnapshot);

    #[async_trait]
    impl SnapshotSource for FixedSnapshots {
        async fn read(&self, _entity: &EntityId) -> Result<StreamSnapshot, String> {
            Ok(self.0.clone())
        }
    }

    /// Executor that rejects one scripted action kind.
    struct ScriptedExecutor {
        reject_salary: bool,
        submitted: Mutex<Vec<StepAction>>,
    }

    impl ScriptedExecutor {
        fn ok() -> Self {
            Self {
                reject_salary: false,
                submitted: Mutex::new(Vec::new()),
            }
        }

        fn rejecting_salary() -> Self {
            Self {
                reject_salary: true,
                ..Self::ok()
            }
        }
    }

    #[async_trait]
    impl ActionExecutor for ScriptedExecutor {
        async fn check_ready(&self) -> Result<(), String> {
            Ok(())
        }

        async fn submit(&self, _entity: &EntityId, action: &StepAction) -> SubmitOutcome {
            self.submitted.lock().await.push(action.clone());
            if self.reject_salary && matches!(action, StepAction::SetSalary { .. }) {
                return SubmitOutcome::rejected("salary mutation reverted");
            }
            SubmitOutcome::confirmed("0xok")
        }
    }

    fn coordinator(allowance: u128) -> Coordinator {
        Coordinator::new(
            SagaRunner::new().with_settle_delay(Duration::ZERO),
            Arc::new(FixedAllowance(allowance)),
        )
    }

    fn current() -> EmployeeState {
        EmployeeState {
            label: "Ada".to_string(),
            rate_per_period: 100,
            active: true,
        }
    }

    fn full_edit() -> EmployeeEdit {
        EmployeeEdit {
            label: Some("Grace".to_string()),
            salary: Some(SalaryTarget {
                rate_per_period: 150,
                start_time: 0,
                start_now: true,
            }),
            active: Some(false),
        }
    }

    #[test]
    fn test_salary_failure_is_isolated_from_other_aspects() {
        tokio_test::block_on(async {
            let executor = ScriptedExecutor::rejecting_salary();
            let result = coordinator(1_000)
                .run_composite(&EntityId::from("emp-1"), &current(), &full_edit(), &executor)
                .await
                .unwrap();

            assert_eq!(result.plans.len(), 3);
            assert_eq!(result.plans[0].status, PlanStatus::Succeeded); // label
            assert_eq!(result.plans[1].status, PlanStatus::Failed); // salary
            assert_eq!(result.plans[2].status, PlanStatus::Succeeded); // status
            assert_eq!(result.aggregate_status(), PlanStatus::Failed);
            assert_eq!(result.succeeded().count(), 2);

            // The status mutation ran even though salary failed.
            let submitted = executor.submitted.lock().await;
            assert!(submitted
                .iter()
                .any(|a| matches!(a, StepAction::SetActive { active: false })));
        });
    }

    #[test]
    fn test_only_changed_aspects_are_built() {
        tokio_test::block_on(async {
            let executor = ScriptedExecutor::ok();
            let edit = EmployeeEdit {
                label: Some("Ada".to_string()), // unchanged
                salary: None,
                active: Some(false),
            };
            let result = coordinator(0)
                .run_composite(&EntityId::from("emp-1"), &current(), &edit, &executor)
                .await
                .unwrap();

            assert_eq!(result.plans.len(), 1);
            assert_eq!(result.plans[0].status, PlanStatus::Succeeded);
            assert_eq!(result.aggregate_status(), PlanStatus::Succeeded);
        });
    }

    #[test]
    fn test_empty_diff_yields_idle_composite() {
        tokio_test::block_on(async {
            let executor = ScriptedExecutor::ok();
            let edit = EmployeeEdit {
                label: Some("Ada".to_string()),
                salary: None,
                active: Some(true),
            };
            let result = coordinator(0)
                .run_composite(&EntityId::from("emp-1"), &current(), &edit, &executor)
                .await
                .unwrap();

            assert!(result.plans.is_empty());
            assert_eq!(result.aggregate_status(), PlanStatus::Idle);
            assert!(executor.submitted.lock().await.is_empty());
        });
    }

    #[test]
    fn test_validation_error_precedes_any_execution() {
        tokio_test::block_on(async {
            let executor = ScriptedExecutor::ok();
            let edit = EmployeeEdit {
                label: Some("Grace".to_string()),
                salary: Some(SalaryTarget {
                    rate_per_period: 0,
                    start_time: 0,
                    start_now: true,
                }),
                active: None,
            };
            let err = coordinator(0)
                .run_composite(&EntityId::from("emp-1"), &current(), &edit, &executor)
                .await
                .unwrap_err();

            assert_eq!(err, PlanError::NonPositiveAmount);
            // The valid label aspect was not executed either.
            assert!(executor.submitted.lock().await.is_empty());
        });
    }

    #[test]
    fn test_busy_entity_is_rejected() {
        tokio_test::block_on(async {
            let locks = Arc::new(EntityLocks::new());
            let coordinator = coordinator(1_000).with_locks(locks.clone());

            let entity = EntityId::from("emp-1");
            let guard = locks.acquire(&entity).await;

            let executor = ScriptedExecutor::ok();
            let err = coordinator
                .run_composite(&entity, &current(), &full_edit(), &executor)
                .await
                .unwrap_err();
            assert_eq!(err, PlanError::EntityBusy(entity.clone()));

            drop(guard);
            let ok = coordinator
                .run_composite(&entity, &current(), &full_edit(), &executor)
                .await
                .unwrap();
            assert_eq!(ok.aggregate_status(), PlanStatus::Succeeded);
        });
    }

    #[test]
    fn test_successful_composite_refreshes_snapshot() {
        tokio_test::block_on(async {
            let fresh = StreamSnapshot {
                rate_per_period: 150,
                unrealized_balance: 12,
                ..Default::default()
            };
            let coordinator = coordinator(1_000)
                .with_snapshot_source(Arc::new(FixedSnapshots(fresh.clone())));

            let executor = ScriptedExecutor::ok();
            let result = coordinator
                .run_composite(&EntityId::from("emp-1"), &current(), &full_edit(), &executor)
                .await
                .unwrap();

            assert_eq!(result.aggregate_status(), PlanStatus::Succeeded);
            assert_eq!(result.refreshed, Some(fresh));
        });
    }

    #[test]
    fn test_single_entry_points_route_through_builder_rules() {
        tokio_test::block_on(async {
            let coordinator = coordinator(0);
            let executor = ScriptedExecutor::ok();
            let entity = EntityId::from("emp-1");

            // No-op salary change short-circuits.
            let noop = coordinator
                .run_salary_change(
                    &entity,
                    100,
                    &SalaryTarget {
                        rate_per_period: 100,
                        start_time: 0,
                        start_now: true,
                    },
                    &executor,
                )
                .await
                .unwrap();
            assert!(noop.is_none());

            let withdraw = coordinator
                .run_withdraw(&entity, 60, 60, &executor)
                .await
                .unwrap();
            assert_eq!(withdraw.status, PlanStatus::Succeeded);

            let deposit = coordinator.run_deposit(&entity, 40, &executor).await.unwrap();
            // Allowance is zero, so the deposit plan carried an
            // approval step.
            assert!(deposit
                .steps
                .iter()
                .any(|s| matches!(s.action, StepAction::Approve { .. })));
            assert_eq!(deposit.status, PlanStatus::Succeeded);
        });
    }

    #[test]
    fn test_organization_and_protocol_entry_points() {
        tokio_test::block_on(async {
            let coordinator = coordinator(0);
            let executor = ScriptedExecutor::ok();
            let entity = EntityId::from("org-1");

            let created = coordinator
                .run_create_organization(&entity, "Acme", "0xusdc", &executor)
                .await
                .unwrap();
            assert_eq!(created.status, PlanStatus::Succeeded);
            assert!(created
                .steps
                .iter()
                .any(|s| matches!(s.action, StepAction::CreateOrganization { .. })));

            let err = coordinator
                .run_protocol_withdraw(&entity, 100, 40, &executor)
                .await
                .unwrap_err();
            assert_eq!(
                err,
                PlanError::InsufficientAvailable {
                    requested: 100,
                    available: 40
                }
            );

            let unstaked = coordinator
                .run_protocol_withdraw(&entity, 40, 40, &executor)
                .await
                .unwrap();
            assert_eq!(unstaked.status, PlanStatus::Succeeded);
            assert!(unstaked.steps.iter().any(|s| matches!(
                s.action,
                StepAction::Withdraw {
                    target: WithdrawTarget::Protocol,
                    ..
                }
            )));
        });
    }
}
