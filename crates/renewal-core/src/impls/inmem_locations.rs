//! In-memory location directory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::domain::{LicenseType, Location, LocationId, StoreError};
use crate::ports::LocationDirectory;

#[derive(Clone, Default)]
pub struct InMemoryLocationDirectory {
    locations: Arc<RwLock<HashMap<LocationId, Location>>>,
}

impl InMemoryLocationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locations(locations: impl IntoIterator<Item = Location>) -> Self {
        let locations = locations.into_iter().map(|l| (l.id, l)).collect();
        Self {
            locations: Arc::new(RwLock::new(locations)),
        }
    }

    /// Insert or replace a location.
    pub async fn upsert(&self, location: Location) {
        self.locations.write().await.insert(location.id, location);
    }

    /// All locations, by name.
    pub async fn all(&self) -> Vec<Location> {
        let mut locations: Vec<Location> = self.locations.read().await.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        locations
    }
}

#[async_trait]
impl LocationDirectory for InMemoryLocationDirectory {
    async fn find_active_with_expiry_at_or_before(
        &self,
        license_type: LicenseType,
        date: NaiveDate,
    ) -> Result<Vec<Location>, StoreError> {
        let mut matches = self.all().await;
        matches.retain(|location| {
            location.active
                && license_type
                    .expiry_of(location)
                    .is_some_and(|expiry| expiry <= date)
        });
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn location(name: &str, active: bool, tobacco: Option<NaiveDate>) -> Location {
        let mut location = Location::new(LocationId::from_ulid(Ulid::new()), name);
        location.active = active;
        location.tobacco_license_expiry = tobacco;
        location
    }

    #[tokio::test]
    async fn filters_by_active_flag_and_expiry() {
        let cutoff = date(2026, 6, 1);
        let directory = InMemoryLocationDirectory::with_locations([
            location("on-cutoff", true, Some(cutoff)),
            location("before", true, Some(date(2026, 1, 1))),
            location("after", true, Some(date(2026, 6, 2))),
            location("inactive", false, Some(date(2026, 1, 1))),
            location("no-license", true, None),
        ]);

        let found = directory
            .find_active_with_expiry_at_or_before(LicenseType::Tobacco, cutoff)
            .await
            .unwrap();
        let names: Vec<&str> = found.iter().map(|l| l.name.as_str()).collect();

        assert_eq!(names, vec!["before", "on-cutoff"]);
    }

    #[tokio::test]
    async fn other_license_field_is_ignored() {
        let directory = InMemoryLocationDirectory::new();
        directory
            .upsert(location("tobacco-only", true, Some(date(2026, 1, 1))))
            .await;

        let found = directory
            .find_active_with_expiry_at_or_before(LicenseType::Alcohol, date(2027, 1, 1))
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
