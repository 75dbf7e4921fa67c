//! Domain model (IDs, locations, renewal tasks, status machine, errors).

pub mod errors;
pub mod ids;
pub mod license;
pub mod location;
pub mod state;
pub mod task;
pub mod user;

pub use errors::{ErrorKind, StoreError, TriggerError};
pub use ids::{LocationId, RenewalTaskId, UserId};
pub use license::{LICENSE_KINDS, LicenseKind, LicenseType, UnknownLicenseType};
pub use location::Location;
pub use state::{ACTIVE_STATUSES, TaskStatus, TransitionError};
pub use task::{ActionType, RenewalTask, TaskKey};
pub use user::{Role, User};
