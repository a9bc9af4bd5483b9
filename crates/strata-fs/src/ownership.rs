use std::path::{Path, PathBuf};

use crate::safepath::normalize;

/// Location of plugin-managed files, relative to the configuration root.
pub const PLUGIN_CACHE_DIR: [&str; 2] = ["plugins", "cache"];

/// Classifies files as user-owned or plugin-managed.
///
/// Anything at or below `<root>/plugins/cache` is installed and refreshed by
/// plugin tooling and must be treated as read-only. This is the single
/// definition of that rule; every mutating entry point asks it.
#[derive(Clone, Debug)]
pub struct OwnershipPolicy {
    protected: PathBuf,
}

impl OwnershipPolicy {
    /// Build the policy for a configuration root.
    pub fn new(root: &Path) -> Self {
        let cache = PLUGIN_CACHE_DIR.iter().fold(root.to_path_buf(), |p, seg| p.join(seg));
        let protected = normalize(&cache).unwrap_or(cache);
        Self { protected }
    }

    /// The protected plugin-cache directory.
    pub fn protected_dir(&self) -> &Path {
        &self.protected
    }

    /// Returns `true` if `path` is plugin-managed.
    pub fn is_plugin_managed(&self, path: &Path) -> bool {
        match normalize(path) {
            Ok(resolved) => resolved.starts_with(&self.protected),
            // An unresolvable path cannot name a file in the cache.
            Err(_) => false,
        }
    }

    /// Returns `true` if `path` belongs to the user and may be mutated.
    pub fn is_user_owned(&self, path: &Path) -> bool {
        !self.is_plugin_managed(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> OwnershipPolicy {
        OwnershipPolicy::new(Path::new("/home/me/.claude"))
    }

    #[test]
    fn plugin_cache_is_protected() {
        let p = policy();
        assert!(p.is_plugin_managed(Path::new("/home/me/.claude/plugins/cache")));
        assert!(p.is_plugin_managed(Path::new(
            "/home/me/.claude/plugins/cache/acme/agents/reviewer.md"
        )));
    }

    #[test]
    fn everything_else_is_user_owned() {
        let p = policy();
        assert!(p.is_user_owned(Path::new("/home/me/.claude/agents/reviewer.md")));
        assert!(p.is_user_owned(Path::new("/home/me/.claude/plugins/installed.json")));
        assert!(p.is_user_owned(Path::new("/home/me/.claude/plugins/cache-old/x.md")));
    }

    #[test]
    fn traversal_into_cache_is_detected() {
        let p = policy();
        assert!(p.is_plugin_managed(Path::new(
            "/home/me/.claude/agents/../plugins/cache/x.md"
        )));
    }

    #[test]
    fn protected_dir_is_normalised() {
        let p = OwnershipPolicy::new(Path::new("/home/me/./x/../.claude"));
        assert_eq!(p.protected_dir(), Path::new("/home/me/.claude/plugins/cache"));
    }
}
