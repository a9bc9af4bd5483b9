use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Number of random bytes appended to every snapshot id.
const SUFFIX_BYTES: usize = 3;

/// Identifier of a backup snapshot directory.
///
/// Format: `<RFC3339 UTC timestamp with nanoseconds, ':' and '.' replaced by
/// '-'>-<6 hex chars>`, e.g. `2026-10-14T09-30-01-123456789Z-a1b2c3`. The
/// fixed-width timestamp makes ids sort lexically in creation order; the
/// random suffix keeps same-instant backups distinct.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Generate an id for a snapshot taken at `at`.
    pub fn generate(at: DateTime<Utc>) -> Self {
        let ts = format_timestamp(at).replace([':', '.'], "-");
        let mut suffix = [0u8; SUFFIX_BYTES];
        rand::Rng::fill(&mut rand::thread_rng(), &mut suffix);
        Self(format!("{ts}-{}", hex::encode(suffix)))
    }

    /// Wrap an existing id (e.g. a directory name read from disk).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns `true` if the id only uses the characters generated ids use.
    pub fn is_well_formed(id: &str) -> bool {
        !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotId({})", self.0)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Format a timestamp the way `meta.json` stores it (RFC3339, nanoseconds, `Z`).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a `meta.json` timestamp. Fractional seconds are optional.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, TypeError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TypeError::InvalidTimestamp {
            value: s.to_string(),
            reason: e.to_string(),
        })
}
