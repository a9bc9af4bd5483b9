use std::io::Read;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use strata_sdk::{
    HookDefinition, InstructionsFile, JsonValue, ProjectId, Scope, Strata, StrataConfig,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let strata = open(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Config(args) => cmd_config(&strata, &format, args),
        Command::Backup(args) => cmd_backup(&strata, &format, args),
        Command::Resource(args) => cmd_resource(&strata, &format, args),
        Command::Hooks(args) => cmd_hooks(&strata, &format, args),
        Command::Instructions(args) => cmd_instructions(&strata, &format, args),
        Command::Memory(args) => cmd_memory(&strata, &format, args),
        Command::Project(args) => cmd_project(&strata, &format, args),
    }
}

fn open(cli: &Cli) -> anyhow::Result<Strata> {
    let mut config = match &cli.config {
        Some(path) => StrataConfig::from_file(path)?,
        None => StrataConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = Some(root.clone());
    }
    Ok(Strata::open(config))
}

/// Print `value` as pretty JSON, or run `text` for human output.
fn emit<T: Serialize>(format: &OutputFormat, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

fn done(format: &OutputFormat, message: String) -> anyhow::Result<()> {
    emit(format, &serde_json::json!({"success": true}), || {
        println!("{} {}", "✓".green().bold(), message);
    })
}

fn project_id(opt: &ProjectOpt) -> Option<ProjectId> {
    opt.project.as_deref().map(ProjectId::from)
}

fn scope(opt: &ProjectOpt) -> Scope {
    project_id(opt).map_or(Scope::Global, Scope::Project)
}

fn read_content(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display())),
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content).context("cannot read stdin")?;
            Ok(content)
        }
    }
}

fn parse_value(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

// ---- config ----

fn cmd_config(strata: &Strata, format: &OutputFormat, args: ConfigArgs) -> anyhow::Result<()> {
    let project = project_id(&args.project);
    let project = project.as_ref();
    match args.action {
        ConfigAction::Show => {
            let effective = strata.effective_config(project)?;
            emit(format, &effective, || {
                for layer in &effective.layers {
                    let state = match (layer.exists, layer.content.is_some()) {
                        (false, _) => "missing".dimmed(),
                        (true, false) => "broken".red(),
                        (true, true) => "ok".green(),
                    };
                    println!("{:<14} {} {}", layer.source.to_string().bold(), state, layer.file_path.display());
                }
                let merged = JsonValue::Object(effective.merged.clone());
                println!("\n{}", serde_json::to_string_pretty(&merged).unwrap_or_default());
            })
        }
        ConfigAction::Get { key } => {
            let effective = strata.effective_config(project)?;
            let value = effective.get(&key).cloned();
            let source = effective.provenance(&key);
            emit(format, &serde_json::json!({"key": key, "value": value, "source": source}), || {
                match (&value, source) {
                    (Some(v), Some(src)) => println!("{} = {}  ({})", key.bold(), v, src.to_string().cyan()),
                    _ => println!("{} = {}", key.bold(), "(not set)".dimmed()),
                }
            })
        }
        ConfigAction::Set { key, value, layer } => {
            strata.set_setting(layer, project, &key, parse_value(&value))?;
            done(format, format!("Set {} in {}", key.bold(), layer.to_string().cyan()))
        }
        ConfigAction::Unset { key, layer } => {
            strata.unset_setting(layer, project, &key)?;
            done(format, format!("Removed {} from {}", key.bold(), layer.to_string().cyan()))
        }
        ConfigAction::Move { key, from, to } => {
            strata.move_setting(from, to, project, &key)?;
            done(format, format!("Moved {} from {} to {}", key.bold(), from.to_string().cyan(), to.to_string().cyan()))
        }
    }
}

// ---- backup ----

fn cmd_backup(strata: &Strata, format: &OutputFormat, args: BackupArgs) -> anyhow::Result<()> {
    match args.action {
        BackupAction::List => {
            let entries = strata.list_backups()?;
            emit(format, &entries, || {
                if entries.is_empty() {
                    println!("No backups.");
                }
                for e in &entries {
                    println!(
                        "{}  {:<6} {:>8}B  {}",
                        e.id.as_str().yellow(),
                        e.operation.to_string().cyan(),
                        e.size,
                        e.original_path.display()
                    );
                }
            })
        }
        BackupAction::Restore { id } => {
            let path = strata.restore_backup(&id)?;
            done(format, format!("Restored {} to {}", id.yellow(), path.display()))
        }
        BackupAction::Prune => {
            let report = strata.prune_backups();
            emit(format, &report, || {
                println!(
                    "{} Pruned {} snapshots ({} expired, {} corrupt, {} stale staging); {} kept",
                    "✓".green(),
                    report.removed().to_string().bold(),
                    report.removed_expired,
                    report.removed_corrupt,
                    report.removed_staging,
                    report.kept
                );
            })
        }
    }
}

// ---- resource ----

fn cmd_resource(strata: &Strata, format: &OutputFormat, args: ResourceArgs) -> anyhow::Result<()> {
    let scope = scope(&args.project);
    match args.action {
        ResourceAction::List { kind } => {
            let resources = strata.list_resources(kind, &scope)?;
            emit(format, &resources, || {
                if resources.is_empty() {
                    println!("No {}.", kind.dir_name());
                }
                for r in &resources {
                    if r.description.is_empty() {
                        println!("{}", r.id.bold());
                    } else {
                        println!("{}  {}", r.id.bold(), r.description.dimmed());
                    }
                }
            })
        }
        ResourceAction::Show { kind, id } => {
            let resource = strata.get_resource(kind, &scope, &id)?;
            emit(format, &resource, || print!("{}", resource.content))
        }
        ResourceAction::Create { kind, id, file } => {
            let content = read_content(file.as_deref())?;
            let created = strata.create_resource(kind, &scope, &id, &content)?;
            done(format, format!("Created {} {}", kind, created.file_path.display()))
        }
        ResourceAction::Update { kind, id, file } => {
            let content = read_content(file.as_deref())?;
            let updated = strata.update_resource(kind, &scope, &id, &content)?;
            done(format, format!("Updated {} {}", kind, updated.file_path.display()))
        }
        ResourceAction::Delete { kind, id } => {
            strata.delete_resource(kind, &scope, &id)?;
            done(format, format!("Deleted {} {}", kind, id.bold()))
        }
        ResourceAction::Search { query, kinds } => {
            let hits = strata.search(&query, &kinds)?;
            emit(format, &hits, || {
                if hits.is_empty() {
                    println!("No matches.");
                }
                for h in &hits {
                    println!("{:<8} {}  {}", h.kind.to_string().cyan(), h.name.bold(), h.file_path.display());
                }
            })
        }
    }
}

// ---- hooks ----

fn cmd_hooks(strata: &Strata, format: &OutputFormat, args: HooksArgs) -> anyhow::Result<()> {
    let scope = scope(&args.project);
    match args.action {
        HooksAction::List => {
            let hooks = strata.list_hooks(&scope)?;
            emit(format, &hooks, || {
                if hooks.is_empty() {
                    println!("No hooks configured.");
                }
                for h in &hooks {
                    let matcher = h.definition.matcher.as_deref().unwrap_or("*");
                    let commands: Vec<&str> = h
                        .definition
                        .hooks
                        .iter()
                        .map(|c| c.command.as_deref().unwrap_or(c.kind.as_str()))
                        .collect();
                    println!("{:<20} {:<10} {}", h.id.to_string().yellow(), matcher, commands.join("; "));
                }
            })
        }
        HooksAction::Add { event, commands, matcher } => {
            let id = strata.add_hook(&scope, event, HookDefinition::from_commands(commands, matcher))?;
            emit(format, &serde_json::json!({"id": id}), || {
                println!("{} Added hook {}", "✓".green().bold(), id.to_string().yellow());
            })
        }
        HooksAction::Remove { id } => {
            strata.remove_hook(&scope, id)?;
            done(format, format!("Removed hook {}", id.to_string().yellow()))
        }
    }
}

// ---- instructions ----

fn print_instructions(label: &str, file: &InstructionsFile) {
    match &file.content {
        Some(content) => {
            println!("{} {}", label.bold(), file.file_path.display());
            println!("{content}");
        }
        None => println!("{} {} {}", label.bold(), file.file_path.display(), "(missing)".dimmed()),
    }
}

fn cmd_instructions(strata: &Strata, format: &OutputFormat, args: InstructionsArgs) -> anyhow::Result<()> {
    let scope = scope(&args.project);
    match args.action {
        InstructionsAction::Show => {
            let instructions = strata.get_instructions(&scope)?;
            emit(format, &instructions, || {
                print_instructions("main", &instructions.main);
                print_instructions("local", &instructions.local);
            })
        }
        InstructionsAction::Update { which, file } => {
            let content = read_content(file.as_deref())?;
            let written = strata.update_instructions(&scope, which, &content)?;
            done(format, format!("Updated {}", written.file_path.display()))
        }
    }
}

// ---- memory ----

fn cmd_memory(strata: &Strata, format: &OutputFormat, args: MemoryArgs) -> anyhow::Result<()> {
    let project = ProjectId::from(args.project.as_str());
    match args.action {
        MemoryAction::List => {
            let files = strata.list_memory(&project)?;
            emit(format, &files, || {
                if files.is_empty() {
                    println!("No memory files.");
                }
                for m in &files {
                    println!("{}", m.filename.bold());
                    for line in m.preview.lines() {
                        println!("  {}", line.dimmed());
                    }
                }
            })
        }
        MemoryAction::Show { filename } => {
            let detail = strata.get_memory(&project, &filename)?;
            emit(format, &detail, || print!("{}", detail.content))
        }
        MemoryAction::Create { filename, file } => {
            let content = read_content(file.as_deref())?;
            let created = strata.create_memory(&project, &filename, &content)?;
            done(format, format!("Created {}", created.file_path.display()))
        }
        MemoryAction::Update { filename, file } => {
            let content = read_content(file.as_deref())?;
            strata.update_memory(&project, &filename, &content)?;
            done(format, format!("Updated {}", filename.bold()))
        }
        MemoryAction::Delete { filename } => {
            strata.delete_memory(&project, &filename)?;
            done(format, format!("Deleted {}", filename.bold()))
        }
    }
}

// ---- project ----

fn cmd_project(strata: &Strata, format: &OutputFormat, args: ProjectArgs) -> anyhow::Result<()> {
    match args.action {
        ProjectAction::List => {
            let projects = strata.list_projects();
            emit(format, &projects, || {
                if projects.is_empty() {
                    println!("No registered projects.");
                }
                for p in &projects {
                    println!("{:<24} {}", p.name.bold(), p.path.display());
                }
            })
        }
        ProjectAction::Resolve { id } => {
            let path = strata.resolve_project(&ProjectId::from(id.as_str()))?;
            emit(format, &serde_json::json!({"id": id, "path": path}), || {
                println!("{}", path.display());
            })
        }
    }
}
