//! ReconcilerBuilder - wiring the reconciler to its collaborators.
//!
//! Missing collaborators are reported by `build()` instead of surfacing as a
//! panic in the middle of the first pass.

use std::sync::Arc;

use super::assignee::{AssigneeLookup, FallbackChainResolver, default_assignee_chain};
use super::reconciler::RenewalReconciler;
use crate::config::RenewalConfig;
use crate::domain::LicenseType;
use crate::ports::{
    AssigneeResolver, Clock, IdGenerator, LocationDirectory, SystemClock, TaskStore,
    UlidGenerator, UserDirectory,
};

/// # Example
/// ```ignore
/// let reconciler = ReconcilerBuilder::new()
///     .locations(Arc::new(directory))
///     .tasks(Arc::new(store))
///     .users(Arc::new(users))
///     .build()?;
/// ```
///
/// Defaults: `SystemClock`, a ULID generator on that clock, every known
/// license type, and the manager-then-admin assignee chain over `users`.
#[derive(Default)]
pub struct ReconcilerBuilder {
    locations: Option<Arc<dyn LocationDirectory>>,
    tasks: Option<Arc<dyn TaskStore>>,
    users: Option<Arc<dyn UserDirectory>>,
    assignees: Option<Arc<dyn AssigneeResolver>>,
    assignee_chain: Option<Vec<AssigneeLookup>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    license_types: Option<Vec<LicenseType>>,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("missing collaborator: {0}")]
    Missing(&'static str),

    #[error("no license types to track")]
    NoLicenseTypes,
}

impl ReconcilerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded with the tracked license types and assignee chain
    /// from `config`.
    pub fn from_config(config: &RenewalConfig) -> Self {
        Self::new()
            .license_types(config.license_types.clone())
            .assignee_chain(config.assignee_chain.clone())
    }

    pub fn locations(mut self, locations: Arc<dyn LocationDirectory>) -> Self {
        self.locations = Some(locations);
        self
    }

    pub fn tasks(mut self, tasks: Arc<dyn TaskStore>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    /// User base for the default fallback-chain resolver.
    pub fn users(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = Some(users);
        self
    }

    /// Replace the fallback chain entirely with a custom resolver.
    pub fn assignees(mut self, assignees: Arc<dyn AssigneeResolver>) -> Self {
        self.assignees = Some(assignees);
        self
    }

    pub fn assignee_chain(mut self, chain: Vec<AssigneeLookup>) -> Self {
        self.assignee_chain = Some(chain);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn license_types(mut self, license_types: Vec<LicenseType>) -> Self {
        self.license_types = Some(license_types);
        self
    }

    pub fn build(self) -> Result<RenewalReconciler, BuildError> {
        let locations = self.locations.ok_or(BuildError::Missing("location directory"))?;
        let tasks = self.tasks.ok_or(BuildError::Missing("task store"))?;

        let assignees: Arc<dyn AssigneeResolver> = match (self.assignees, self.users) {
            (Some(assignees), _) => assignees,
            (None, Some(users)) => Arc::new(FallbackChainResolver::new(
                users,
                self.assignee_chain.unwrap_or_else(default_assignee_chain),
            )),
            (None, None) => return Err(BuildError::Missing("user directory or assignee resolver")),
        };

        let mut license_types: Vec<LicenseType> = Vec::new();
        for license_type in self.license_types.unwrap_or_else(LicenseType::all) {
            if !license_types.contains(&license_type) {
                license_types.push(license_type);
            }
        }
        if license_types.is_empty() {
            return Err(BuildError::NoLicenseTypes);
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));

        Ok(RenewalReconciler {
            locations,
            tasks,
            assignees,
            clock,
            ids,
            license_types,
        })
    }
}
