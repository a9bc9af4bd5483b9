//! User-editable markdown resources.
//!
//! A resource is a single `<id>.md` file with optional YAML frontmatter,
//! stored under `<base>/agents`, `<base>/commands` or `<base>/skills`. The
//! store keeps nothing in memory; the filesystem is the only owner of the
//! bytes.
//!
//! Two plainer markdown surfaces share the same mutation rules: the
//! `CLAUDE.md`/`CLAUDE.local.md` instruction files of a scope
//! ([`InstructionsStore`]) and per-project memory notes ([`MemoryStore`]).
//!
//! Mutations snapshot the old file through `strata-backup` before changing
//! it. Ownership rules (plugin-managed files are read-only) are enforced one
//! level up, by the SDK.

pub mod error;
pub mod frontmatter;
pub mod id;
pub mod instructions;
pub mod memory;
pub mod search;
pub mod store;

pub use error::{ResourceError, ResourceResult};
pub use frontmatter::{
    serialize_markdown, truncate_body, FrontmatterParser, MarkdownDoc, YamlFrontmatter,
};
pub use id::{validate_resource_id, RESOURCE_EXTENSION};
pub use instructions::{Instructions, InstructionsFile, InstructionsKind, InstructionsStore};
pub use memory::{
    validate_memory_filename, MemoryDetail, MemoryFile, MemoryStore, MEMORY_DIR, MEMORY_PREVIEW_LINES,
};
pub use search::{matches_query, search, SearchHit, PREVIEW_LINES};
pub use store::{ResourceFile, ResourceStore};
