//! Error types shared by the ports and the reconciler.

use thiserror::Error;

use super::ids::RenewalTaskId;
use super::state::TransitionError;

/// Operational classification of a failure.
///
/// - Transient: worth retrying on the next pass
/// - Permanent: retrying will not help
/// - Infrastructure: the backing store itself is unhealthy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

/// Failure reported by a persistence-backed port.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("task {0} already exists")]
    Conflict(RenewalTaskId),

    #[error("task {0} not found")]
    TaskNotFound(RenewalTaskId),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unavailable(_) => ErrorKind::Infrastructure,
            StoreError::Conflict(_) | StoreError::Other(_) => ErrorKind::Transient,
            StoreError::TaskNotFound(_) | StoreError::Transition(_) => ErrorKind::Permanent,
        }
    }
}

/// Failure of the manual trigger surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    #[error("trigger queue is full; a pass is already running")]
    Busy,

    #[error("scheduler is stopped")]
    Stopped,
}
