use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

// ---------------------------------------------------------------------------
// BackupOperation
// ---------------------------------------------------------------------------

/// The mutation that triggered a backup snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupOperation {
    /// The file was about to be overwritten.
    Update,
    /// The file (or a key inside it) was about to be removed.
    Delete,
    /// A key was about to be moved between two files.
    Move,
}

impl BackupOperation {
    /// The wire name stored in `meta.json`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Move => "move",
        }
    }
}

impl fmt::Display for BackupOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackupOperation {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "move" => Ok(Self::Move),
            other => Err(TypeError::UnknownOperation(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// LayerSource
// ---------------------------------------------------------------------------

/// Identifies which settings layer a file belongs to.
///
/// Layers are listed in ascending override priority: a later layer's keys
/// win over an earlier layer's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerSource {
    /// `<root>/settings.json`
    Global,
    /// `<root>/settings.local.json`
    GlobalLocal,
    /// `<project>/.claude/settings.json`
    Project,
    /// `<project>/.claude/settings.local.json`
    ProjectLocal,
}

impl LayerSource {
    /// All layers in merge order.
    pub const ALL: [LayerSource; 4] = [
        Self::Global,
        Self::GlobalLocal,
        Self::Project,
        Self::ProjectLocal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::GlobalLocal => "global-local",
            Self::Project => "project",
            Self::ProjectLocal => "project-local",
        }
    }

    /// Returns `true` for layers that live inside a project directory.
    pub fn is_project_scoped(&self) -> bool {
        matches!(self, Self::Project | Self::ProjectLocal)
    }

    /// The settings file name for this layer.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Global | Self::Project => "settings.json",
            Self::GlobalLocal | Self::ProjectLocal => "settings.local.json",
        }
    }
}

impl fmt::Display for LayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerSource {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|layer| layer.as_str() == s)
            .ok_or_else(|| TypeError::UnknownLayer(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

/// A category of user-editable markdown resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Agent,
    Command,
    Skill,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::Agent, Self::Command, Self::Skill];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Command => "command",
            Self::Skill => "skill",
        }
    }

    /// The fixed subdirectory holding resources of this kind.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Agent => "agents",
            Self::Command => "commands",
            Self::Skill => "skills",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = TypeError;

    /// Accepts both the singular kind name and its directory name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s || kind.dir_name() == s)
            .ok_or_else(|| TypeError::UnknownResourceKind(s.to_string()))
    }
}
