//! renewal-core
//!
//! Keeps every active location covered by a renewal task before its alcohol
//! or tobacco license lapses.
//!
//! # Modules
//! - **domain**: ids, locations, license registry, renewal tasks, status machine, errors
//! - **ports**: LocationDirectory, TaskStore, UserDirectory, AssigneeResolver, Clock, IdGenerator
//! - **app**: reconciler, builder, assignee chain, scheduler, reports
//! - **impls**: in-memory backends and the JSON snapshot
//! - **config**: `RenewalConfig`

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{
    PassReport, ReconcilerBuilder, RenewalReconciler, SchedulerHandle, SchedulerStatus,
};
pub use config::{ConfigError, RenewalConfig};
