//! Impls - in-memory implementations of the ports.
//!
//! Used by the CLI (seeded from a JSON snapshot) and by tests. A deployment
//! against a real database provides its own `TaskStore` /
//! `LocationDirectory` / `UserDirectory`.

pub mod inmem_locations;
pub mod inmem_task_store;
pub mod inmem_users;
pub mod snapshot;

pub use self::inmem_locations::InMemoryLocationDirectory;
pub use self::inmem_task_store::InMemoryTaskStore;
pub use self::inmem_users::InMemoryUserDirectory;
pub use self::snapshot::{InMemoryBackend, Snapshot, SnapshotError};
