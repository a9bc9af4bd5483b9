use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use strata_sdk::{HookEvent, HookId, InstructionsKind, LayerSource, ResourceKind};

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Strata: versioned configuration management for ~/.claude",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Configuration root, overriding the config file and CLAUDE_HOME
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Inspect and edit layered settings
    Config(ConfigArgs),
    /// List, restore, and prune snapshots
    Backup(BackupArgs),
    /// Manage agents, commands, and skills
    Resource(ResourceArgs),
    /// Manage hooks
    Hooks(HooksArgs),
    /// Read and edit CLAUDE.md and CLAUDE.local.md
    Instructions(InstructionsArgs),
    /// Manage a project's memory notes
    Memory(MemoryArgs),
    /// Registered projects
    Project(ProjectArgs),
}

/// Scope selector shared by project-aware commands.
#[derive(Args, Clone, Debug, Default)]
pub struct ProjectOpt {
    /// Encoded project id (directory name under <root>/projects)
    #[arg(long, global = true)]
    pub project: Option<String>,
}

// ---- config ----

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
    #[command(flatten)]
    pub project: ProjectOpt,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the merged settings and their layers
    Show,
    /// Print the merged value at a key path
    Get { key: String },
    /// Set a key path; the value is parsed as JSON, else taken as a string
    Set {
        key: String,
        value: String,
        #[arg(long, default_value = "global")]
        layer: LayerSource,
    },
    /// Remove a key path
    Unset {
        key: String,
        #[arg(long, default_value = "global")]
        layer: LayerSource,
    },
    /// Move a key path between layers
    Move {
        key: String,
        #[arg(long)]
        from: LayerSource,
        #[arg(long)]
        to: LayerSource,
    },
}

// ---- backup ----

#[derive(Args)]
pub struct BackupArgs {
    #[command(subcommand)]
    pub action: BackupAction,
}

#[derive(Subcommand)]
pub enum BackupAction {
    /// List snapshots, newest first
    List,
    /// Restore a snapshot over its original file
    Restore { id: String },
    /// Remove expired and corrupt snapshots now
    Prune,
}

// ---- resource ----

#[derive(Args)]
pub struct ResourceArgs {
    #[command(subcommand)]
    pub action: ResourceAction,
    #[command(flatten)]
    pub project: ProjectOpt,
}

#[derive(Subcommand)]
pub enum ResourceAction {
    List { kind: ResourceKind },
    Show { kind: ResourceKind, id: String },
    /// Create from --file, or stdin when omitted
    Create {
        kind: ResourceKind,
        id: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Replace content from --file, or stdin when omitted
    Update {
        kind: ResourceKind,
        id: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    Delete { kind: ResourceKind, id: String },
    /// Search names, descriptions, and body previews
    Search {
        query: String,
        #[arg(long = "kind")]
        kinds: Vec<ResourceKind>,
    },
}

// ---- hooks ----

#[derive(Args)]
pub struct HooksArgs {
    #[command(subcommand)]
    pub action: HooksAction,
    #[command(flatten)]
    pub project: ProjectOpt,
}

#[derive(Subcommand)]
pub enum HooksAction {
    List,
    Add {
        event: HookEvent,
        #[arg(long = "command", required = true)]
        commands: Vec<String>,
        #[arg(long)]
        matcher: Option<String>,
    },
    Remove { id: HookId },
}

// ---- instructions ----

#[derive(Args)]
pub struct InstructionsArgs {
    #[command(subcommand)]
    pub action: InstructionsAction,
    #[command(flatten)]
    pub project: ProjectOpt,
}

#[derive(Subcommand)]
pub enum InstructionsAction {
    /// Print both instruction files of the scope
    Show,
    /// Replace one file from --file, or stdin when omitted
    Update {
        #[arg(default_value = "main")]
        which: InstructionsKind,
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

// ---- memory ----

#[derive(Args)]
pub struct MemoryArgs {
    #[command(subcommand)]
    pub action: MemoryAction,
    /// Encoded project id (directory name under <root>/projects)
    #[arg(long)]
    pub project: String,
}

#[derive(Subcommand)]
pub enum MemoryAction {
    List,
    Show { filename: String },
    /// Create from --file, or stdin when omitted
    Create {
        filename: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Write content from --file, or stdin when omitted
    Update {
        filename: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    Delete { filename: String },
}

// ---- project ----

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    List,
    /// Print the path of a registered project id
    Resolve { id: String },
}
