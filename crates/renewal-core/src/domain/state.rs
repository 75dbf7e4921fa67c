//! RenewalTask status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a renewal task.
///
/// State transitions:
/// - Assigned -> InProgress -> Completed
/// - Assigned | InProgress -> Suspended -> Assigned | InProgress
/// - Assigned | InProgress | Suspended -> Cancelled
///
/// Completed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Newly created and assigned; nobody has started it.
    Assigned,

    InProgress,

    /// Blocked on something external; requires a status reason.
    Suspended,

    #[serde(alias = "DONE")]
    Completed,

    Cancelled,
}

/// Statuses that block creation of another renewal task for the same key.
pub const ACTIVE_STATUSES: &[TaskStatus] = &[
    TaskStatus::Assigned,
    TaskStatus::InProgress,
    TaskStatus::Suspended,
];

impl TaskStatus {
    pub fn is_active(self) -> bool {
        ACTIVE_STATUSES.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// Whether a status reason must accompany this status.
    pub fn requires_reason(self) -> bool {
        matches!(self, TaskStatus::Suspended)
    }

    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Assigned, InProgress)
                | (Assigned | InProgress, Suspended)
                | (Suspended, Assigned | InProgress)
                | (InProgress, Completed)
                | (Assigned | InProgress | Suspended, Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Assigned => "ASSIGNED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Suspended => "SUSPENDED",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("invalid transition from {from} to {to}")]
    NotAllowed { from: TaskStatus, to: TaskStatus },

    #[error("status {0} requires a reason")]
    MissingReason(TaskStatus),
}
