//! # Paystream Core
//!
//! Core logic for a streaming-payroll application: an employer
//! deposits funds into an on-chain organization account, employees
//! accrue salary continuously over a configurable period, and
//! accrued funds can be withdrawn or redirected.
//!
//! This crate contains:
//! - Snapshot / Step / Plan definitions
//! - The accrual engine (pure derivation from a cached snapshot)
//! - Plan builders (diff current vs desired state)
//! - The saga runner (sequential, halt-on-failure execution)
//!
//! This crate does NOT care about:
//! - Signing, wallets, or network selection
//! - How the indexer produces snapshots
//! - How plan progress is displayed

pub mod accrual;
pub mod builder;
pub mod error;
pub mod executor;
pub mod saga;
pub mod types;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::accrual::{derive_accrual, AccrualResult};
    pub use crate::builder::{
        build_create_organization_plan, build_deposit_plan, build_label_plan,
        build_protocol_withdraw_plan, build_salary_plan, build_status_plan, build_withdraw_plan,
        SalaryTarget,
    };
    pub use crate::error::PlanError;
    pub use crate::executor::{ActionExecutor, AllowanceSource, SnapshotSource, SubmitOutcome};
    pub use crate::saga::{PlanProgressReporter, SagaRunner, WatchReporter};
    pub use crate::types::{
        EntityId, PlanKind, PlanStatus, RawStreamSnapshot, Step, StepAction, StepStatus,
        StreamSnapshot, TransactionPlan, WithdrawTarget,
    };
}

// Re-export key types at crate root
pub use accrual::{derive_accrual, AccrualResult};
pub use builder::SalaryTarget;
pub use error::PlanError;
pub use executor::{ActionExecutor, AllowanceSource, SnapshotSource, SubmitOutcome};
pub use saga::{PlanProgressReporter, SagaRunner, WatchReporter};
pub use types::{EntityId, PlanKind, PlanStatus, StreamSnapshot, TransactionPlan};
