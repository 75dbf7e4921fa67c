//! Regulated license categories tracked per location.
//!
//! Each category is described by a [`LicenseKind`] entry in [`LICENSE_KINDS`]:
//! the type tag, a human label and the accessor that reads the expiry date
//! from a [`Location`]. Adding a category means adding a variant, a field on
//! `Location` and a row in the table; the reconciler only ever iterates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenseType {
    Alcohol,
    Tobacco,
}

/// Table row describing one license category.
#[derive(Debug, Clone, Copy)]
pub struct LicenseKind {
    pub license_type: LicenseType,
    pub label: &'static str,
    pub expiry: fn(&Location) -> Option<NaiveDate>,
}

pub const LICENSE_KINDS: &[LicenseKind] = &[
    LicenseKind {
        license_type: LicenseType::Alcohol,
        label: "alcohol",
        expiry: alcohol_expiry,
    },
    LicenseKind {
        license_type: LicenseType::Tobacco,
        label: "tobacco",
        expiry: tobacco_expiry,
    },
];

fn alcohol_expiry(location: &Location) -> Option<NaiveDate> {
    location.alcohol_license_expiry
}

fn tobacco_expiry(location: &Location) -> Option<NaiveDate> {
    location.tobacco_license_expiry
}

impl LicenseType {
    /// Every known license type, in table order.
    pub fn all() -> Vec<LicenseType> {
        LICENSE_KINDS.iter().map(|kind| kind.license_type).collect()
    }

    pub fn kind(self) -> &'static LicenseKind {
        match self {
            LicenseType::Alcohol => &LICENSE_KINDS[0],
            LicenseType::Tobacco => &LICENSE_KINDS[1],
        }
    }

    pub fn label(self) -> &'static str {
        self.kind().label
    }

    /// Expiry date of this license at `location`, if one is recorded.
    pub fn expiry_of(self, location: &Location) -> Option<NaiveDate> {
        (self.kind().expiry)(location)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LicenseType::Alcohol => "ALCOHOL",
            LicenseType::Tobacco => "TOBACCO",
        }
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown license type '{0}'")]
pub struct UnknownLicenseType(pub String);

impl FromStr for LicenseType {
    type Err = UnknownLicenseType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LICENSE_KINDS
            .iter()
            .find(|kind| kind.license_type.as_str().eq_ignore_ascii_case(s) || kind.label == s)
            .map(|kind| kind.license_type)
            .ok_or_else(|| UnknownLicenseType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::LocationId;
    use rstest::rstest;
    use ulid::Ulid;

    fn location() -> Location {
        let mut location = Location::new(LocationId::from_ulid(Ulid::new()), "Store 7");
        location.alcohol_license_expiry = NaiveDate::from_ymd_opt(2026, 1, 10);
        location
    }

    #[test]
    fn every_variant_has_a_table_row() {
        for license_type in [LicenseType::Alcohol, LicenseType::Tobacco] {
            assert_eq!(license_type.kind().license_type, license_type);
        }
        assert_eq!(LicenseType::all().len(), LICENSE_KINDS.len());
    }

    #[test]
    fn accessor_reads_matching_field() {
        let location = location();
        assert_eq!(
            LicenseType::Alcohol.expiry_of(&location),
            NaiveDate::from_ymd_opt(2026, 1, 10)
        );
        assert_eq!(LicenseType::Tobacco.expiry_of(&location), None);
    }

    #[rstest]
    #[case::upper("ALCOHOL", LicenseType::Alcohol)]
    #[case::lower("tobacco", LicenseType::Tobacco)]
    #[case::mixed("Tobacco", LicenseType::Tobacco)]
    fn parses_names(#[case] input: &str, #[case] expected: LicenseType) {
        assert_eq!(input.parse::<LicenseType>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(
            "firearms".parse::<LicenseType>(),
            Err(UnknownLicenseType("firearms".to_string()))
        );
    }

    #[test]
    fn serializes_screaming_case() {
        assert_eq!(
            serde_json::to_string(&LicenseType::Alcohol).unwrap(),
            "\"ALCOHOL\""
        );
    }
}
