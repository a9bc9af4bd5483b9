//! Foundation types for Strata.
//!
//! This crate provides the vocabulary shared by every other Strata crate:
//! the JSON object model settings files are read into, the identifiers used
//! for snapshots and registered projects, and the small closed enums that
//! name mutation operations, configuration layers and resource kinds.
//!
//! # Key Types
//!
//! - [`JsonObject`]: in-memory representation of a settings file
//! - [`SnapshotId`]: lexically sortable backup identifier
//! - [`BackupOperation`]: the mutation that triggered a backup
//! - [`LayerSource`]: which settings layer a file belongs to
//! - [`ResourceKind`]: agent, command or skill
//! - [`ProjectId`]: encoded-path identifier of a registered project

pub mod error;
pub mod json;
pub mod kinds;
pub mod project;
pub mod snapshot;

pub use error::TypeError;
pub use json::{parse_object, JsonObject, JsonValue};
pub use kinds::{BackupOperation, LayerSource, ResourceKind};
pub use project::ProjectId;
pub use snapshot::{format_timestamp, parse_timestamp, SnapshotId};
