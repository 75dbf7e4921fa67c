//! Ports - the seams to the outside world.
//!
//! Each trait stands in for an external collaborator (location management,
//! task persistence, user accounts) or an ambient service (time, ids).
//! In-memory implementations live in `impls`.

pub mod assignee;
pub mod clock;
pub mod id_generator;
pub mod location_directory;
pub mod task_store;

pub use self::assignee::{AssigneeResolver, UserDirectory};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::location_directory::LocationDirectory;
pub use self::task_store::TaskStore;
