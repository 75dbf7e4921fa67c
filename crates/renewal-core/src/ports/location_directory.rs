//! LocationDirectory port - read access to tracked locations.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{LicenseType, Location, StoreError};

#[async_trait]
pub trait LocationDirectory: Send + Sync {
    /// Active locations whose `license_type` expiry is on or before `date`.
    ///
    /// Locations with no expiry recorded for `license_type` should not be
    /// returned, but callers re-check before acting.
    async fn find_active_with_expiry_at_or_before(
        &self,
        license_type: LicenseType,
        date: NaiveDate,
    ) -> Result<Vec<Location>, StoreError>;
}
