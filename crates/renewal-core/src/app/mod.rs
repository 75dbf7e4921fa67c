//! App - application layer
//!
//! Combines the ports into the renewal workflow.
//!
//! # Components
//! - **ReconcilerBuilder**: wiring and defaults
//! - **RenewalReconciler**: one reconciliation pass over all license types
//! - **FallbackChainResolver**: default-assignee lookup chain
//! - **SchedulerHandle**: daily trigger plus manual runs

pub mod assignee;
pub mod builder;
pub mod reconciler;
pub mod scheduler;
pub mod status;

pub use self::assignee::{AssigneeLookup, FallbackChainResolver, default_assignee_chain};
pub use self::builder::{BuildError, ReconcilerBuilder};
pub use self::reconciler::{
    EnsureOutcome, RENEWAL_HORIZON_MONTHS, RenewalReconciler, renewal_deadline, renewal_horizon,
};
pub use self::scheduler::{DailySchedule, SchedulerHandle, SchedulerSettings};
pub use self::status::{
    CreatedTask, PassFailure, PassReport, PassSummary, SchedulerStatus, TriggerSource,
};
