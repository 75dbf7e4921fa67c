//! Pass reports and scheduler status views.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{LicenseType, Location, LocationId, RenewalTask, RenewalTaskId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTask {
    pub task_id: RenewalTaskId,
    pub location_id: LocationId,
    pub location_name: String,
    pub license_type: LicenseType,
    pub deadline: NaiveDate,
    pub assignee: Option<UserId>,
}

/// A unit of work that failed during a pass.
///
/// `location_id` is `None` when a whole license type could not be queried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassFailure {
    pub location_id: Option<LocationId>,
    pub license_type: LicenseType,
    pub error: String,
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub today: NaiveDate,
    pub horizon: NaiveDate,
    pub created: Vec<CreatedTask>,
    pub already_active: usize,
    pub skipped_no_expiry: usize,
    pub failures: Vec<PassFailure>,
}

impl PassReport {
    pub fn new(started_at: DateTime<Utc>, today: NaiveDate, horizon: NaiveDate) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            today,
            horizon,
            created: Vec::new(),
            already_active: 0,
            skipped_no_expiry: 0,
            failures: Vec::new(),
        }
    }

    pub fn record_created(&mut self, location: &Location, task: &RenewalTask) {
        self.created.push(CreatedTask {
            task_id: task.id,
            location_id: location.id,
            location_name: location.name.clone(),
            license_type: task.license_type(),
            deadline: task.deadline,
            assignee: task.assignee,
        });
    }

    pub fn tasks_created(&self) -> usize {
        self.created.len()
    }

    /// Created tasks with nobody to own them.
    pub fn unowned(&self) -> usize {
        self.created.iter().filter(|t| t.assignee.is_none()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Scheduled,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    pub source: TriggerSource,
    pub finished_at: DateTime<Utc>,
    pub tasks_created: usize,
    pub already_active: usize,
    pub failures: usize,
}

impl PassSummary {
    pub fn new(source: TriggerSource, report: &PassReport) -> Self {
        Self {
            source,
            finished_at: report.finished_at,
            tasks_created: report.tasks_created(),
            already_active: report.already_active,
            failures: report.failures.len(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub scheduled_runs: u64,
    pub manual_runs: u64,
    pub running: bool,
    pub next_run_at: Option<NaiveDateTime>,
    pub last_pass: Option<PassSummary>,
}

impl SchedulerStatus {
    pub fn total_runs(&self) -> u64 {
        self.scheduled_runs + self.manual_runs
    }
}
