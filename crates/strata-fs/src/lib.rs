//! Filesystem primitives for Strata.
//!
//! Every write path in Strata goes through this crate. It owns the three
//! guarantees the rest of the engine builds on:
//!
//! 1. A reader never observes a partially written file ([`write_atomic`]).
//! 2. No caller-supplied path escapes the allowed roots ([`assert_safe_path`]).
//! 3. Plugin-managed files are identified by a single predicate
//!    ([`OwnershipPolicy`]).
//!
//! # Modules
//!
//! - [`atomic`]: write-to-temp-then-rename, plus JSON read/write helpers
//! - [`safepath`]: allow-list checks, project registration lookups
//! - [`ownership`]: plugin-cache ownership predicate
//! - [`home`]: configuration root discovery

pub mod atomic;
pub mod error;
pub mod home;
pub mod ownership;
pub mod safepath;

pub use atomic::{read_json_object_lossy, write_atomic, write_json_pretty};
pub use error::{FsError, FsResult};
pub use home::{ClaudeHome, CLAUDE_HOME_ENV};
pub use ownership::OwnershipPolicy;
pub use safepath::{
    allowed_roots, assert_safe_path, normalize, project_registered, resolve_project_path,
    PROJECTS_DIR,
};
