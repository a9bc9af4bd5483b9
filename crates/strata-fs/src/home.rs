use std::path::{Path, PathBuf};

/// Environment variable overriding the configuration root.
pub const CLAUDE_HOME_ENV: &str = "CLAUDE_HOME";

/// Name of the configuration root under the user's home directory.
const DEFAULT_DIR_NAME: &str = ".claude";

/// Discovery of the configuration root directory.
pub struct ClaudeHome;

impl ClaudeHome {
    /// Resolve the configuration root from the environment.
    ///
    /// `CLAUDE_HOME` wins when it is set and names an existing path. Otherwise
    /// `~/.claude`, or `<tmp>/.claude` if no home directory is known.
    pub fn resolve() -> PathBuf {
        let env = std::env::var_os(CLAUDE_HOME_ENV).map(PathBuf::from);
        Self::resolve_from(env.as_deref(), dirs::home_dir().as_deref())
    }

    /// Resolution with explicit inputs; [`ClaudeHome::resolve`] feeds it the
    /// process environment.
    pub fn resolve_from(env_override: Option<&Path>, home: Option<&Path>) -> PathBuf {
        if let Some(dir) = env_override {
            if !dir.as_os_str().is_empty() && dir.exists() {
                return dir.to_path_buf();
            }
        }
        match home {
            Some(h) => h.join(DEFAULT_DIR_NAME),
            None => std::env::temp_dir().join(DEFAULT_DIR_NAME),
        }
    }
}
