//! TaskStore port - source of truth for renewal tasks.
//!
//! The at-most-one-active-task rule depends on the existence check and the
//! insert happening as one unit. Implementations backed by a database should
//! run `create_unless_active` inside a single transaction (or behind a unique
//! partial index on the task key for active statuses).

use async_trait::async_trait;

use crate::domain::{RenewalTask, StoreError, TaskKey, TaskStatus};

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Does a task exist for `key` whose status is in `statuses`?
    async fn exists_active(&self, key: &TaskKey, statuses: &[TaskStatus])
    -> Result<bool, StoreError>;

    /// Insert `task` unconditionally.
    async fn create(&self, task: RenewalTask) -> Result<RenewalTask, StoreError>;

    /// Insert `task` unless a task for its key is already in `statuses`.
    ///
    /// Returns `None` when an existing task blocked the insert. The default
    /// implementation is a plain check followed by an insert and is only
    /// race-free when no other writer touches the same key concurrently;
    /// stores shared between concurrent passes must override it atomically.
    async fn create_unless_active(
        &self,
        task: RenewalTask,
        statuses: &[TaskStatus],
    ) -> Result<Option<RenewalTask>, StoreError> {
        if self.exists_active(&task.key(), statuses).await? {
            return Ok(None);
        }
        self.create(task).await.map(Some)
    }
}
