//! Assignee ports - who owns auto-created tasks.

use async_trait::async_trait;

use crate::domain::{Role, StoreError, User};

/// Read access to the user base.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Some user holding `role`, lowest username first.
    async fn find_first_with_role(&self, role: Role) -> Result<Option<User>, StoreError>;
}

/// Yields the default owner for tasks created by the reconciler.
///
/// Never fails: "nobody" is a valid answer.
#[async_trait]
pub trait AssigneeResolver: Send + Sync {
    async fn default_assignee(&self) -> Option<User>;
}
