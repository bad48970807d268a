//! Change detection and schema version numbering across runs.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use crate::sql::Dialect;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed version state in {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode version state: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Version number exhausted after {0}")]
    Exhausted(u32),
}

/// Persisted record of the last generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionState {
    pub last_version: u32,
    /// Source path to hex SHA-256 of its content.
    pub file_hashes: BTreeMap<String, String>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_generated: Option<DateTime<Utc>>,
}

/// RFC 3339, or an offset-less ISO 8601 timestamp read as local time.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_timestamp(&raw)
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    let ts = Local
        .from_local_datetime(&naive)
        .earliest()
        .map_or_else(|| naive.and_utc(), |ts| ts.with_timezone(&Utc));
    Some(ts)
}

/// Hex SHA-256 digest of `bytes`.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn fingerprint_file(path: &Path) -> Result<String, VersionError> {
    let bytes = fs::read(path).map_err(|source| VersionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(fingerprint(&bytes))
}

fn state_key(path: &Path) -> String {
    path.display().to_string()
}

/// Tracks source fingerprints and the last issued version in a JSON file.
///
/// State is read once on `load` and written once on `commit`. A run that never
/// commits leaves the state untouched, so the next run reissues the same
/// version for the same changes.
#[derive(Debug)]
pub struct VersionTracker {
    state_path: PathBuf,
    state: VersionState,
}

impl VersionTracker {
    /// Load state from `state_path`; a missing file means no prior version.
    pub fn load(state_path: impl Into<PathBuf>) -> Result<Self, VersionError> {
        let state_path = state_path.into();
        let state = match fs::read_to_string(&state_path) {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| VersionError::Decode {
                    path: state_path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %state_path.display(), "no version state, starting at 0");
                VersionState::default()
            }
            Err(source) => {
                return Err(VersionError::Io {
                    path: state_path,
                    source,
                });
            }
        };

        Ok(Self { state_path, state })
    }

    pub fn state(&self) -> &VersionState {
        &self.state
    }

    /// True if any path is new or its content differs from the last commit.
    pub fn has_changed<P: AsRef<Path>>(&self, paths: &[P]) -> Result<bool, VersionError> {
        for path in paths {
            let path = path.as_ref();
            let current = fingerprint_file(path)?;
            if self.state.file_hashes.get(&state_key(path)) != Some(&current) {
                debug!(path = %path.display(), "source changed");
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn next_version(&self) -> Result<u32, VersionError> {
        self.state
            .last_version
            .checked_add(1)
            .ok_or(VersionError::Exhausted(self.state.last_version))
    }

    /// Record `version` and the current fingerprints of `paths`, then persist.
    pub fn commit<P: AsRef<Path>>(&mut self, paths: &[P], version: u32) -> Result<(), VersionError> {
        let mut file_hashes = BTreeMap::new();
        for path in paths {
            let path = path.as_ref();
            file_hashes.insert(state_key(path), fingerprint_file(path)?);
        }

        self.state = VersionState {
            last_version: version,
            file_hashes,
            last_generated: Some(Utc::now()),
        };
        self.save()?;

        info!(version, path = %self.state_path.display(), "recorded schema version");
        Ok(())
    }

    fn save(&self) -> Result<(), VersionError> {
        let json = serde_json::to_string_pretty(&self.state)?;
        fs::write(&self.state_path, json).map_err(|source| VersionError::Io {
            path: self.state_path.clone(),
            source,
        })
    }
}

/// File name for a generated migration script.
///
/// Versioned runs produce `V0003__20240101120000__create_schema_oracle.sql`;
/// unversioned runs `V20240101120000__create_initial_schema.sql`.
pub fn migration_file_name(version: Option<u32>, dialect: Dialect, at: DateTime<Local>) -> String {
    let timestamp = at.format("%Y%m%d%H%M%S");
    match version {
        Some(version) => format!("V{version:04}__{timestamp}__create_schema_{dialect}.sql"),
        None => format!("V{timestamp}__create_initial_schema.sql"),
    }
}
