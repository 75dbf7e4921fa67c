//! JSON snapshot of all in-memory backends.
//!
//! Stands in for the database of a deployed system: it seeds the directories
//! and the task store, and can be written back after a pass.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::{InMemoryLocationDirectory, InMemoryTaskStore, InMemoryUserDirectory};
use crate::domain::{Location, RenewalTask, User};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid snapshot {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub tasks: Vec<RenewalTask>,
}

/// The three in-memory backends built from one snapshot.
#[derive(Clone)]
pub struct InMemoryBackend {
    pub locations: InMemoryLocationDirectory,
    pub users: InMemoryUserDirectory,
    pub tasks: InMemoryTaskStore,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let raw = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SnapshotError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Write through a temp file in the same directory, then rename over
    /// `path`. A crash mid-write leaves the previous snapshot intact.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec_pretty(self)?;
        let write_err = |source: std::io::Error| SnapshotError::Write {
            path: path.display().to_string(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&json).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    pub fn into_backend(self) -> InMemoryBackend {
        InMemoryBackend {
            locations: InMemoryLocationDirectory::with_locations(self.locations),
            users: InMemoryUserDirectory::with_users(self.users),
            tasks: InMemoryTaskStore::with_tasks(self.tasks),
        }
    }
}

impl InMemoryBackend {
    pub async fn snapshot(&self) -> Snapshot {
        Snapshot {
            locations: self.locations.all().await,
            users: self.users.all().await,
            tasks: self.tasks.all().await,
        }
    }
}
