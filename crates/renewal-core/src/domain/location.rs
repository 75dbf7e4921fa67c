//! Tracked retail locations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::LocationId;

/// A retail location and the expiry dates of its regulated licenses.
///
/// Owned by location-management flows; the reconciler only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub alcohol_license_expiry: Option<NaiveDate>,

    #[serde(default)]
    pub tobacco_license_expiry: Option<NaiveDate>,
}

fn default_active() -> bool {
    true
}

impl Location {
    /// Active location with no licenses on record.
    pub fn new(id: LocationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: None,
            active: true,
            alcohol_license_expiry: None,
            tobacco_license_expiry: None,
        }
    }
}
