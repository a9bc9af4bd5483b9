use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_backup::{
    InlineScheduler, NoopScheduler, PruneScheduler, ThreadScheduler, TokioScheduler,
    DEFAULT_RETENTION_DAYS,
};
use strata_fs::ClaudeHome;

use crate::error::{SdkError, SdkResult};

/// Where background prune passes run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    /// A detached thread per pass.
    #[default]
    Thread,
    /// On the calling thread, before the write returns.
    Inline,
    /// On the current Tokio runtime's blocking pool; a thread outside one.
    Tokio,
    /// Never; prune only on request.
    #[serde(rename = "none")]
    Disabled,
}

impl SchedulerKind {
    pub fn build(self) -> Arc<dyn PruneScheduler> {
        match self {
            Self::Thread => Arc::new(ThreadScheduler),
            Self::Inline => Arc::new(InlineScheduler),
            Self::Tokio => match TokioScheduler::current() {
                Some(scheduler) => Arc::new(scheduler),
                None => Arc::new(ThreadScheduler),
            },
            Self::Disabled => Arc::new(NoopScheduler),
        }
    }
}

/// Engine configuration, usually read from a TOML file:
///
/// ```toml
/// root = "/home/me/.claude"
/// retention_days = 14
/// projects_file = "/home/me/.config/strata/projects.json"
/// scheduler = "inline"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    /// Configuration root. Resolved from the environment when unset.
    pub root: Option<PathBuf>,
    /// Snapshots older than this many days are pruned.
    pub retention_days: u32,
    /// JSON array of extra allowed directories.
    pub projects_file: Option<PathBuf>,
    pub scheduler: SchedulerKind,
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            root: None,
            retention_days: DEFAULT_RETENTION_DAYS as u32,
            projects_file: None,
            scheduler: SchedulerKind::Thread,
        }
    }
}

impl StrataConfig {
    /// Configuration pinned to `root`, defaults otherwise.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Default::default()
        }
    }

    /// Load from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> SdkResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| SdkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| SdkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// The configured root, or the one discovered from the environment.
    pub fn resolved_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(ClaudeHome::resolve)
    }
}
