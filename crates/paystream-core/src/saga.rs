//! Saga runner
//!
//! Executes a plan's steps strictly in index order against the
//! action executor, halting on the first failure. Each transition
//! replaces the plan value wholesale and pushes the new snapshot to
//! the progress reporter; callers render the stream of snapshots as
//! step-by-step progress.
//!
//! There is no automatic retry anywhere: retry is exclusively a
//! fresh, user-initiated rebuild of the plan against the partially
//! updated current state (see `builder`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::executor::{ActionExecutor, SubmitOutcome};
use crate::types::{PlanStatus, TransactionPlan};

/// Sink for whole-plan progress snapshots.
#[async_trait]
pub trait PlanProgressReporter: Send + Sync {
    async fn report(&self, plan: TransactionPlan) -> Result<(), String>;
}

/// Reporter that publishes plan snapshots over a `watch` channel.
/// Late subscribers observe the latest snapshot immediately.
pub struct WatchReporter {
    tx: watch::Sender<TransactionPlan>,
}

impl WatchReporter {
    /// Create a reporter seeded with the plan's initial (idle) state.
    pub fn new(initial: TransactionPlan) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<TransactionPlan> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl PlanProgressReporter for WatchReporter {
    async fn report(&self, plan: TransactionPlan) -> Result<(), String> {
        // No subscribers is a non-error; the returned plan remains
        // the source of truth.
        let _ = self.tx.send(plan);
        Ok(())
    }
}

/// Default settle delay for the trailing finalize step.
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1_000);

/// Executes plans sequentially, one step at a time.
///
/// Runner instances hold no per-plan state, so one runner may serve
/// plans for different entities concurrently. Serializing plans for
/// the *same* entity is the caller's job (see the runtime crate's
/// entity locks).
pub struct SagaRunner {
    settle_delay: Duration,
    reporter: Option<Arc<dyn PlanProgressReporter>>,
}

impl SagaRunner {
    pub fn new() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            reporter: None,
        }
    }

    /// Set how long the finalize step waits before settling.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// How long the finalize step waits before settling.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Attach a progress reporter for plan snapshots.
    pub fn with_reporter(mut self, reporter: Arc<dyn PlanProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Run a plan to a terminal status.
    ///
    /// Steps execute strictly in order; a step failure captures the
    /// error detail on that step and halts — later steps are never
    /// attempted. A precondition failure from `check_ready` fails
    /// the plan with zero steps attempted. A plan that already
    /// started or terminated is returned unchanged: re-running the
    /// same session is not a sanctioned path.
    pub async fn run(
        &self,
        mut plan: TransactionPlan,
        executor: &dyn ActionExecutor,
    ) -> TransactionPlan {
        if plan.is_terminal() || plan.has_started() {
            return plan;
        }

        if let Err(message) = executor.check_ready().await {
            tracing::warn!(
                plan_id = %plan.id,
                entity_id = %plan.entity_id,
                error = %message,
                "plan rejected before first step"
            );
            plan.fail_before_start(message);
            self.report(&plan).await;
            return plan;
        }

        for position in 0..plan.steps.len() {
            let action = plan.steps[position].action.clone();

            plan.start_step(position);
            tracing::info!(
                plan_id = %plan.id,
                entity_id = %plan.entity_id,
                step_index = plan.steps[position].index,
                action = %plan.steps[position].description,
                "step started"
            );
            self.report(&plan).await;

            let outcome = if action.is_local() {
                self.run_local(&action).await
            } else {
                executor.submit(&plan.entity_id, &action).await
            };

            match outcome {
                SubmitOutcome::Confirmed { reference } => {
                    plan.succeed_step(position, reference);
                    tracing::info!(
                        plan_id = %plan.id,
                        entity_id = %plan.entity_id,
                        step_index = plan.steps[position].index,
                        "step succeeded"
                    );
                    self.report(&plan).await;
                }
                SubmitOutcome::Rejected { message } => {
                    tracing::error!(
                        plan_id = %plan.id,
                        entity_id = %plan.entity_id,
                        step_index = plan.steps[position].index,
                        error = %message,
                        "step failed; halting plan"
                    );
                    plan.fail_step(position, message);
                    self.report(&plan).await;
                    return plan;
                }
            }
        }

        debug_assert_eq!(plan.status, PlanStatus::Succeeded);
        plan
    }

    async fn run_local(&self, action: &crate::types::StepAction) -> SubmitOutcome {
        if matches!(action, crate::types::StepAction::Finalize) && !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        SubmitOutcome::Confirmed { reference: None }
    }

    async fn report(&self, plan: &TransactionPlan) {
        if let Some(reporter) = &self.reporter {
            if let Err(err) = reporter.report(plan.clone()).await {
                tracing::warn!(plan_id = %plan.id, "failed to report plan progress: {}", err);
            }
        }
    }
}

impl Default for SagaRunner {
    fn default() -> Self {
        Self::new()
    }
}
