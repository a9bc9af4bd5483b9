use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Character that stands in for every path separator in an encoded id.
pub const SEPARATOR_PLACEHOLDER: char = '-';

/// Opaque identifier of a registered project.
///
/// The tool names a project directory by its absolute path with every
/// separator replaced by `-`: `/Users/x/y` becomes `-Users-x-y`. The
/// encoding is not injective (a `-` inside a directory name decodes to a
/// separator), so the id, not the decoded path, is the key of record.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Wrap an already-encoded identifier.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encode a filesystem path into a project identifier.
    pub fn encode(path: &Path) -> Self {
        let raw = path.to_string_lossy();
        let encoded: String = raw
            .chars()
            .map(|c| if std::path::is_separator(c) { SEPARATOR_PLACEHOLDER } else { c })
            .collect();
        Self(encoded)
    }

    /// Decode back to the absolute path the identifier names.
    pub fn decode(&self) -> Result<PathBuf, TypeError> {
        if self.0.is_empty() {
            return Err(TypeError::EmptyPath);
        }
        let rest = self.0.strip_prefix(SEPARATOR_PLACEHOLDER).unwrap_or(&self.0);
        if rest.is_empty() {
            return Err(TypeError::EmptyDecodedPath(self.0.clone()));
        }
        Ok(PathBuf::from(format!("/{}", rest.replace(SEPARATOR_PLACEHOLDER, "/"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectId({})", self.0)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
