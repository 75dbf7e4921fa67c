//! Service configuration loaded from a JSON file.
//!
//! Every field has a default, so an empty object `{}` is a valid config.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::app::{AssigneeLookup, DailySchedule, SchedulerSettings, default_assignee_chain};
use crate::domain::LicenseType;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// ScheduleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Local time of day, `HH:MM` or `HH:MM:SS`.
    #[serde(default = "default_run_at", with = "time_of_day")]
    pub run_at: NaiveTime,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Manual triggers allowed to wait behind a running pass.
    #[serde(default = "default_trigger_queue")]
    pub trigger_queue: usize,
}

fn default_run_at() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_enabled() -> bool {
    true
}

fn default_trigger_queue() -> usize {
    4
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            run_at: default_run_at(),
            enabled: default_enabled(),
            trigger_queue: default_trigger_queue(),
        }
    }
}

// ---------------------------------------------------------------------------
// RenewalConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewalConfig {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default = "default_assignee_chain")]
    pub assignee_chain: Vec<AssigneeLookup>,
    #[serde(default = "LicenseType::all")]
    pub license_types: Vec<LicenseType>,
}

impl Default for RenewalConfig {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            assignee_chain: default_assignee_chain(),
            license_types: LicenseType::all(),
        }
    }
}

impl RenewalConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `load` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.license_types.is_empty() {
            return Err(ConfigError::Invalid("license_types must not be empty".into()));
        }
        if self.schedule.trigger_queue == 0 {
            return Err(ConfigError::Invalid(
                "schedule.trigger_queue must be at least 1".into(),
            ));
        }
        if self.assignee_chain.iter().any(|lookup| {
            matches!(lookup, AssigneeLookup::Username(name) if name.trim().is_empty())
        }) {
            return Err(ConfigError::Invalid(
                "assignee_chain contains an empty username".into(),
            ));
        }
        Ok(())
    }

    pub fn daily_schedule(&self) -> Option<DailySchedule> {
        self.schedule
            .enabled
            .then(|| DailySchedule::new(self.schedule.run_at))
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            schedule: self.daily_schedule(),
            trigger_queue: self.schedule.trigger_queue,
        }
    }
}

mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M:%S"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map_err(|_| de::Error::custom(format!("invalid time of day `{raw}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use rstest::rstest;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_object_uses_defaults() {
        let file = write_config("{}");
        let config = RenewalConfig::load(file.path()).unwrap();
        assert_eq!(config, RenewalConfig::default());
        assert_eq!(config.schedule.run_at, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert!(config.schedule.enabled);
        assert_eq!(config.license_types, vec![LicenseType::Alcohol, LicenseType::Tobacco]);
    }

    #[rstest]
    #[case("\"07:30\"", 7, 30, 0)]
    #[case("\"18:05:09\"", 18, 5, 9)]
    fn run_at_formats(#[case] raw: &str, #[case] h: u32, #[case] m: u32, #[case] s: u32) {
        let file = write_config(&format!(r#"{{"schedule":{{"run_at":{raw}}}}}"#));
        let config = RenewalConfig::load(file.path()).unwrap();
        assert_eq!(config.schedule.run_at, NaiveTime::from_hms_opt(h, m, s).unwrap());
    }

    #[test]
    fn bad_run_at_is_a_parse_error() {
        let file = write_config(r#"{"schedule":{"run_at":"nine"}}"#);
        let err = RenewalConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn empty_license_types_rejected() {
        let file = write_config(r#"{"license_types":[]}"#);
        let err = RenewalConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_trigger_queue_rejected() {
        let file = write_config(r#"{"schedule":{"trigger_queue":0}}"#);
        assert!(matches!(
            RenewalConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RenewalConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn full_config() {
        let file = write_config(
            r#"{
                "schedule": {"run_at": "06:00", "enabled": false, "trigger_queue": 2},
                "assignee_chain": [{"by": "role", "value": "MANAGER"}],
                "license_types": ["TOBACCO"]
            }"#,
        );
        let config = RenewalConfig::load(file.path()).unwrap();

        assert_eq!(config.assignee_chain, vec![AssigneeLookup::Role(Role::Manager)]);
        assert_eq!(config.license_types, vec![LicenseType::Tobacco]);
        assert_eq!(
            config.scheduler_settings(),
            SchedulerSettings {
                schedule: None,
                trigger_queue: 2,
            }
        );
    }

    #[test]
    fn run_at_serializes_with_seconds() {
        let json = serde_json::to_value(RenewalConfig::default()).unwrap();
        assert_eq!(json["schedule"]["run_at"], "09:00:00");
    }
}
