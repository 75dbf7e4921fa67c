//! RenewalReconciler - creates renewal tasks for licenses nearing expiry.
//!
//! # Flow of one pass
//! 1. today from the clock, horizon = today + 3 months
//! 2. resolve the default assignee once (absence is fine)
//! 3. for each tracked license type: query active locations expiring on or
//!    before the horizon, then `ensure_renewal_task` for each of them
//!
//! Failures are contained to the (location, license type) unit that hit
//! them; the pass always runs to the end and reports what it did.

use std::sync::Arc;

use chrono::{Months, NaiveDate};
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::status::{PassFailure, PassReport};
use crate::domain::{
    ACTIVE_STATUSES, LicenseType, Location, RenewalTask, StoreError, TaskKey, User,
};
use crate::ports::{AssigneeResolver, Clock, IdGenerator, LocationDirectory, TaskStore};

/// Look-ahead window, in calendar months.
pub const RENEWAL_HORIZON_MONTHS: u32 = 3;

/// Last date whose expiry triggers a renewal task when the pass runs on `today`.
///
/// Month ends clamp (Nov 30 -> Feb 28).
pub fn renewal_horizon(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_months(Months::new(RENEWAL_HORIZON_MONTHS))
        .unwrap_or(NaiveDate::MAX)
}

/// Deadline of a renewal task: the expiry date, never earlier than today.
pub fn renewal_deadline(expiry: NaiveDate, today: NaiveDate) -> NaiveDate {
    expiry.max(today)
}

/// What `ensure_renewal_task` did for one (location, license type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created(RenewalTask),
    /// An active renewal task already covers this license.
    AlreadyActive,
    /// The location has no expiry on record for this license type.
    NoExpiry,
}

/// Values fixed for the duration of one pass.
struct PassContext<'a> {
    today: NaiveDate,
    assignee: Option<&'a User>,
}

pub struct RenewalReconciler {
    pub(crate) locations: Arc<dyn LocationDirectory>,
    pub(crate) tasks: Arc<dyn TaskStore>,
    pub(crate) assignees: Arc<dyn AssigneeResolver>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) license_types: Vec<LicenseType>,
}

impl RenewalReconciler {
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn license_types(&self) -> &[LicenseType] {
        &self.license_types
    }

    /// One complete reconciliation pass.
    pub async fn run_reconciliation(&self) -> PassReport {
        let started_at = self.clock.now();
        let today = self.clock.today();
        let horizon = renewal_horizon(today);
        let span = info_span!("reconciliation_pass", %today, %horizon);

        async move {
            info!("license renewal pass started");

            let assignee = self.assignees.default_assignee().await;
            if assignee.is_none() {
                warn!("no default assignee found; renewal tasks will be created without an owner");
            }
            let ctx = PassContext {
                today,
                assignee: assignee.as_ref(),
            };

            let mut report = PassReport::new(started_at, today, horizon);
            for &license_type in &self.license_types {
                self.reconcile_license_type(&ctx, license_type, horizon, &mut report)
                    .await;
            }
            report.finished_at = self.clock.now();

            info!(
                created = report.tasks_created(),
                already_active = report.already_active,
                unowned = report.unowned(),
                failures = report.failures.len(),
                "license renewal pass completed"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn reconcile_license_type(
        &self,
        ctx: &PassContext<'_>,
        license_type: LicenseType,
        horizon: NaiveDate,
        report: &mut PassReport,
    ) {
        let due = match self
            .locations
            .find_active_with_expiry_at_or_before(license_type, horizon)
            .await
        {
            Ok(due) => due,
            Err(err) => {
                error!(%license_type, error = %err, kind = ?err.kind(), "location query failed; skipping license type");
                report.failures.push(PassFailure {
                    location_id: None,
                    license_type,
                    error: err.to_string(),
                });
                return;
            }
        };
        debug!(%license_type, count = due.len(), "locations due for renewal");

        for location in &due {
            match self.ensure_with(ctx, location, license_type).await {
                Ok(EnsureOutcome::Created(task)) => report.record_created(location, &task),
                Ok(EnsureOutcome::AlreadyActive) => report.already_active += 1,
                Ok(EnsureOutcome::NoExpiry) => report.skipped_no_expiry += 1,
                Err(err) => {
                    error!(
                        location = %location.name,
                        location_id = %location.id,
                        %license_type,
                        error = %err,
                        kind = ?err.kind(),
                        "failed to ensure renewal task; will retry next pass"
                    );
                    report.failures.push(PassFailure {
                        location_id: Some(location.id),
                        license_type,
                        error: err.to_string(),
                    });
                }
            }
        }
    }

    /// Make sure `location` has exactly one active renewal task for
    /// `license_type`, creating it if none exists.
    pub async fn ensure_renewal_task(
        &self,
        location: &Location,
        license_type: LicenseType,
    ) -> Result<EnsureOutcome, StoreError> {
        let assignee = self.assignees.default_assignee().await;
        let ctx = PassContext {
            today: self.clock.today(),
            assignee: assignee.as_ref(),
        };
        self.ensure_with(&ctx, location, license_type).await
    }

    async fn ensure_with(
        &self,
        ctx: &PassContext<'_>,
        location: &Location,
        license_type: LicenseType,
    ) -> Result<EnsureOutcome, StoreError> {
        let Some(expiry) = license_type.expiry_of(location) else {
            debug!(location = %location.name, %license_type, "no expiry on record; skipping");
            return Ok(EnsureOutcome::NoExpiry);
        };

        let key = TaskKey::renewal(location.id, license_type);
        if self.tasks.exists_active(&key, ACTIVE_STATUSES).await? {
            info!(location = %location.name, %key, "renewal task already exists");
            return Ok(EnsureOutcome::AlreadyActive);
        }

        let task = self.build_task(ctx, location, key, expiry);
        // the store re-checks under its own transaction
        match self.tasks.create_unless_active(task, ACTIVE_STATUSES).await? {
            Some(task) => {
                info!(
                    location = %location.name,
                    %license_type,
                    task_id = %task.id,
                    deadline = %task.deadline,
                    "created renewal task"
                );
                if task.assignee.is_none() {
                    warn!(task_id = %task.id, location = %location.name, "renewal task has no owner");
                }
                Ok(EnsureOutcome::Created(task))
            }
            None => {
                info!(location = %location.name, %key, "renewal task created concurrently; skipping");
                Ok(EnsureOutcome::AlreadyActive)
            }
        }
    }

    fn build_task(
        &self,
        ctx: &PassContext<'_>,
        location: &Location,
        key: TaskKey,
        expiry: NaiveDate,
    ) -> RenewalTask {
        let owner = ctx.assignee.map(|user| user.id);
        RenewalTask::new(
            self.ids.generate_task_id(),
            key,
            format!(
                "Renewal of {} license - {}",
                key.license_type.label(),
                location.name
            ),
            "Automatically created license renewal task.",
            owner,
            owner,
            renewal_deadline(expiry, ctx.today),
            self.clock.now(),
        )
    }
}
