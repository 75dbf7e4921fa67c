//! In-memory task store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{
    LocationId, RenewalTask, RenewalTaskId, StoreError, TaskKey, TaskStatus,
};
use crate::ports::TaskStore;

/// Task state behind the lock.
///
/// Every trait method takes the lock once and releases it before returning,
/// so one call is one transaction.
#[derive(Default)]
struct TaskStoreState {
    tasks: HashMap<RenewalTaskId, RenewalTask>,
}

impl TaskStoreState {
    fn has_match(&self, key: &TaskKey, statuses: &[TaskStatus]) -> bool {
        self.tasks
            .values()
            .any(|task| task.key() == *key && statuses.contains(&task.status()))
    }

    fn insert(&mut self, task: RenewalTask) -> Result<RenewalTask, StoreError> {
        if self.tasks.contains_key(&task.id) {
            return Err(StoreError::Conflict(task.id));
        }
        self.tasks.insert(task.id, task.clone());
        Ok(task)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<Mutex<TaskStoreState>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with existing tasks (e.g. from a snapshot).
    pub fn with_tasks(tasks: impl IntoIterator<Item = RenewalTask>) -> Self {
        let tasks = tasks.into_iter().map(|task| (task.id, task)).collect();
        Self {
            state: Arc::new(Mutex::new(TaskStoreState { tasks })),
        }
    }

    /// All tasks, oldest first.
    pub async fn all(&self) -> Vec<RenewalTask> {
        let state = self.state.lock().await;
        let mut tasks: Vec<RenewalTask> = state.tasks.values().cloned().collect();
        tasks.sort_by_key(|task| (task.created_at, task.id));
        tasks
    }

    pub async fn for_location(&self, location_id: LocationId) -> Vec<RenewalTask> {
        let mut tasks = self.all().await;
        tasks.retain(|task| task.location_id == location_id);
        tasks
    }

    /// Status change on behalf of a human task-management flow.
    pub async fn transition(
        &self,
        id: RenewalTaskId,
        next: TaskStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<RenewalTask, StoreError> {
        let mut state = self.state.lock().await;
        let task = state
            .tasks
            .get_mut(&id)
            .ok_or(StoreError::TaskNotFound(id))?;
        task.transition(next, reason, now)?;
        Ok(task.clone())
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn exists_active(
        &self,
        key: &TaskKey,
        statuses: &[TaskStatus],
    ) -> Result<bool, StoreError> {
        Ok(self.state.lock().await.has_match(key, statuses))
    }

    async fn create(&self, task: RenewalTask) -> Result<RenewalTask, StoreError> {
        self.state.lock().await.insert(task)
    }

    async fn create_unless_active(
        &self,
        task: RenewalTask,
        statuses: &[TaskStatus],
    ) -> Result<Option<RenewalTask>, StoreError> {
        let mut state = self.state.lock().await;
        if state.has_match(&task.key(), statuses) {
            return Ok(None);
        }
        state.insert(task).map(Some)
    }
}
