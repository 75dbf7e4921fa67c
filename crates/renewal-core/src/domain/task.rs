use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{LocationId, RenewalTaskId, UserId};
use super::license::LicenseType;
use super::state::{TaskStatus, TransitionError};

/// What the task asks the assignee to do with the license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Obtain a license the location does not hold yet.
    New,
    Renewal,
}

/// Identity of the "at most one active task" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub location_id: LocationId,
    pub license_type: LicenseType,
    pub action_type: ActionType,
}

impl TaskKey {
    pub fn renewal(location_id: LocationId, license_type: LicenseType) -> Self {
        Self {
            location_id,
            license_type,
            action_type: ActionType::Renewal,
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{:?}",
            self.location_id, self.license_type, self.action_type
        )
    }
}

/// A license work item.
///
/// `license_type` and `action_type` are private: they are fixed at creation
/// and only exposed through getters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalTask {
    pub id: RenewalTaskId,
    pub title: String,
    pub description: String,
    license_type: LicenseType,
    action_type: ActionType,
    status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status_reason: Option<String>,
    pub location_id: LocationId,
    pub assignee: Option<UserId>,
    pub created_by: Option<UserId>,
    pub deadline: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RenewalTask {
    /// A fresh task in `Assigned` with no status reason.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RenewalTaskId,
        key: TaskKey,
        title: impl Into<String>,
        description: impl Into<String>,
        assignee: Option<UserId>,
        created_by: Option<UserId>,
        deadline: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            license_type: key.license_type,
            action_type: key.action_type,
            status: TaskStatus::Assigned,
            status_reason: None,
            location_id: key.location_id,
            assignee,
            created_by,
            deadline,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn license_type(&self) -> LicenseType {
        self.license_type
    }

    pub fn action_type(&self) -> ActionType {
        self.action_type
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn status_reason(&self) -> Option<&str> {
        self.status_reason.as_deref()
    }

    pub fn key(&self) -> TaskKey {
        TaskKey {
            location_id: self.location_id,
            license_type: self.license_type,
            action_type: self.action_type,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Move to `next`, enforcing the state machine.
    ///
    /// A reason is kept only for statuses that require one.
    pub fn transition(
        &mut self,
        next: TaskStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError::NotAllowed {
                from: self.status,
                to: next,
            });
        }
        let reason = reason.filter(|r| !r.trim().is_empty());
        if next.requires_reason() && reason.is_none() {
            return Err(TransitionError::MissingReason(next));
        }

        self.status = next;
        self.status_reason = if next.requires_reason() { reason } else { None };
        self.updated_at = now;
        Ok(())
    }
}
