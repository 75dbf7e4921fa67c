//! IdGenerator port - ID generation behind a trait.
//!
//! # Implementations
//! - **UlidGenerator**: ULID-based, timestamped from a `Clock`

use std::sync::Arc;

use crate::domain::ids::RenewalTaskId;
use crate::ports::Clock;
use ulid::Ulid;

/// Generates identifiers for records the engine creates.
///
/// Requires `Send + Sync` because a single generator is shared across passes.
pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> RenewalTaskId;
}

/// ULID-based generator.
///
/// The timestamp half comes from the injected clock, so task ids sort by
/// creation time even under a `FixedClock`.
pub struct UlidGenerator {
    clock: Arc<dyn Clock>,
}

impl UlidGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl IdGenerator for UlidGenerator {
    fn generate_task_id(&self) -> RenewalTaskId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        RenewalTaskId::from(ulid)
    }
}
