use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_types::{format_timestamp, parse_timestamp, BackupOperation, SnapshotId};

use crate::error::{BackupError, BackupResult};

/// Metadata file inside every snapshot directory.
pub const META_FILE: &str = "meta.json";

/// Byte-for-byte copy of the snapshotted file.
pub const PAYLOAD_FILE: &str = "file";

// ---------------------------------------------------------------------------
// BackupMeta
// ---------------------------------------------------------------------------

/// On-disk form of `meta.json`.
///
/// Every field defaults to empty so that an incomplete file parses and can
/// be reported as incomplete rather than as a syntax error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMeta {
    #[serde(default)]
    pub original_path: String,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub timestamp: String,
}

impl BackupMeta {
    pub fn new(original_path: &Path, operation: BackupOperation, at: DateTime<Utc>) -> Self {
        Self {
            original_path: original_path.to_string_lossy().into_owned(),
            operation: operation.as_str().to_string(),
            timestamp: format_timestamp(at),
        }
    }

    /// Read and parse `<dir>/meta.json`.
    pub fn read(dir: &Path) -> BackupResult<Self> {
        let bytes = fs::read(dir.join(META_FILE))
            .map_err(|_| BackupError::corrupt(dir, "missing meta.json"))?;
        serde_json::from_slice(&bytes).map_err(|_| BackupError::corrupt(dir, "invalid meta.json"))
    }

    /// Check that every field is present and well-formed.
    pub fn validate(&self, dir: &Path) -> BackupResult<(DateTime<Utc>, BackupOperation)> {
        if self.original_path.is_empty() || self.operation.is_empty() || self.timestamp.is_empty() {
            return Err(BackupError::corrupt(dir, "incomplete meta.json"));
        }
        let operation = self
            .operation
            .parse::<BackupOperation>()
            .map_err(|_| BackupError::corrupt(dir, format!("unknown operation {:?}", self.operation)))?;
        let timestamp = parse_timestamp(&self.timestamp)
            .map_err(|_| BackupError::corrupt(dir, format!("bad timestamp {:?}", self.timestamp)))?;
        Ok((timestamp, operation))
    }
}

// ---------------------------------------------------------------------------
// BackupEntry
// ---------------------------------------------------------------------------

/// One immutable, fully validated snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BackupEntry {
    pub id: SnapshotId,
    pub timestamp: DateTime<Utc>,
    pub original_path: PathBuf,
    pub operation: BackupOperation,
    /// The snapshot directory.
    pub dir: PathBuf,
    /// Size of the payload in bytes (0 if the payload is missing).
    pub size: u64,
}

impl BackupEntry {
    /// Load and validate the snapshot stored in `dir`.
    pub fn load(dir: &Path) -> BackupResult<Self> {
        let meta = BackupMeta::read(dir)?;
        let (timestamp, operation) = meta.validate(dir)?;
        let id = dir
            .file_name()
            .map(|n| SnapshotId::new(n.to_string_lossy().into_owned()))
            .ok_or_else(|| BackupError::corrupt(dir, "snapshot directory has no name"))?;
        let size = fs::metadata(dir.join(PAYLOAD_FILE)).map(|m| m.len()).unwrap_or(0);
        Ok(Self {
            id,
            timestamp,
            original_path: PathBuf::from(meta.original_path),
            operation,
            dir: dir.to_path_buf(),
            size,
        })
    }

    /// Path of the payload copy.
    pub fn payload_path(&self) -> PathBuf {
        self.dir.join(PAYLOAD_FILE)
    }
}

// ---------------------------------------------------------------------------
// PruneReport
// ---------------------------------------------------------------------------

/// Result of one retention pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Snapshots removed because their metadata was missing or unusable.
    pub removed_corrupt: usize,
    /// Snapshots removed because they were older than the cutoff.
    pub removed_expired: usize,
    /// Abandoned staging directories removed.
    pub removed_staging: usize,
    /// Snapshots left in place.
    pub kept: usize,
}

impl PruneReport {
    pub fn removed(&self) -> usize {
        self.removed_corrupt + self.removed_expired + self.removed_staging
    }
}
