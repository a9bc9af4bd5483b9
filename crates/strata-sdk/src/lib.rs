//! High-level SDK for Strata.
//!
//! [`Strata`] binds every subsystem to one configuration root and is the
//! entry point for applications (the `strata` CLI included). It is also the
//! single place where the ownership rule is enforced: every mutating call
//! refuses plugin-managed paths before any engine code runs.

pub mod config;
pub mod error;
pub mod strata;

pub use config::{SchedulerKind, StrataConfig};
pub use error::{SdkError, SdkResult};
pub use strata::{ProjectInfo, Scope, Strata};

// Re-export the types callers need to drive the facade.
pub use strata_backup::{BackupEntry, PruneReport};
pub use strata_config::{ConfigLayer, EffectiveConfig, HookDefinition, HookEntry, HookEvent, HookId};
pub use strata_resource::{
    Instructions, InstructionsFile, InstructionsKind, MemoryDetail, MemoryFile, ResourceFile,
    SearchHit,
};
pub use strata_types::{JsonObject, JsonValue, LayerSource, ProjectId, ResourceKind};
