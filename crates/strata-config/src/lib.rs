//! Layered JSON settings for Strata.
//!
//! Settings live in up to four files, merged in ascending priority:
//!
//! | Layer | File |
//! |---|---|
//! | `global` | `<root>/settings.json` |
//! | `global-local` | `<root>/settings.local.json` |
//! | `project` | `<project>/.claude/settings.json` |
//! | `project-local` | `<project>/.claude/settings.local.json` |
//!
//! Reading ([`ConfigLayers`]) never caches: every query reads the files
//! fresh. Writing ([`SettingsWriter`], [`HookStore`]) snapshots the old file
//! through `strata-backup` and commits through `strata_fs::write_atomic`.

pub mod error;
pub mod hooks;
pub mod layers;
pub mod writer;

pub use error::{ConfigError, ConfigResult};
pub use hooks::{HookCommand, HookDefinition, HookEntry, HookEvent, HookId, HookStore, HOOKS_KEY};
pub use layers::{
    deep_merge, resolve_layer_path, ConfigLayer, ConfigLayers, EffectiveConfig, PROJECT_CONFIG_DIR,
};
pub use writer::SettingsWriter;
