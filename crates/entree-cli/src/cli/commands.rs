//! # CLI Layer
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Reads and writes the data file on behalf of the user
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! ## Responsibilities
//!
//! 1. **Logging**: install the `tracing` subscriber (`RUST_LOG`, or `-v` for debug)
//! 2. **Context Setup**: load `entree.toml` and the data file into an [`EntityStore`]
//! 3. **Dispatch**: route each subcommand to the store
//! 4. **Persistence**: write the document back when a command changed it

use super::render;
use super::setup::{AttrCommands, Cli, Commands};
use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use console::Term;
use entree::commands::add::{NEW_ATTRIBUTE_NAME, NEW_ENTITY_NAME};
use entree::commands::{self, delete, AttributePatch, EntityPatch};
use entree::config::EntreeConfig;
use entree::io;
use entree::model::{EntityFilter, EntityId, EntitySystem, PrimaryKey};
use entree::store::EntityStore;
use entree::validation::{AttributeDraft, EntityDraft};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Everything a command handler needs: the store, where it came from, and settings.
struct AppContext {
    store: EntityStore,
    data_file: PathBuf,
    config: EntreeConfig,
    cwd: PathBuf,
}

impl AppContext {
    fn open(cwd: &Path, file_override: Option<PathBuf>) -> Result<Self> {
        let config = EntreeConfig::load(cwd)?;
        let data_file = file_override.unwrap_or_else(|| cwd.join(&config.data_file));

        let mut store = EntityStore::new();
        if data_file.exists() {
            let text = fs::read_to_string(&data_file)
                .with_context(|| format!("failed to read {}", data_file.display()))?;
            store
                .import_text(&text)
                .with_context(|| format!("failed to load {}", data_file.display()))?;
        } else {
            debug!(path = %data_file.display(), "no data file yet, starting empty");
        }

        Ok(Self {
            store,
            data_file,
            config,
            cwd: cwd.to_path_buf(),
        })
    }

    fn save(&self) -> Result<()> {
        io::write_collection(self.store.entities(), &self.data_file)?;
        info!(path = %self.data_file.display(), "data file saved");
        Ok(())
    }

    fn require_entity(&self, entity_id: EntityId) -> Result<()> {
        if self.store.entities().contains(entity_id) {
            Ok(())
        } else {
            bail!("Entity {} not found", entity_id)
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let mut ctx = AppContext::open(&cwd, cli.file)?;

    let command = cli.command.unwrap_or(Commands::List {
        system: None,
        search: None,
    });
    if handle(&mut ctx, command)? {
        ctx.save()?;
    }
    Ok(())
}

/// Runs one command. Returns whether the collection changed and must be saved.
fn handle(ctx: &mut AppContext, command: Commands) -> Result<bool> {
    match command {
        Commands::List { system, search } => {
            handle_list(ctx, system, search);
            Ok(false)
        }
        Commands::Search { query } => {
            let hits = commands::search_hits(ctx.store.entities(), &query);
            print!("{}", render::render_search_hits(&hits));
            Ok(false)
        }
        Commands::Show { id } => {
            let entities = ctx.store.entities();
            let entity = entities
                .get(id)
                .ok_or_else(|| anyhow!("Entity {} not found", id))?;
            print!("{}", render::render_entity(entities, entity));
            Ok(false)
        }
        Commands::Add {
            parent,
            name,
            system,
        } => {
            if let Some(pid) = parent {
                ctx.require_entity(pid)?;
            }
            let entity = if name.is_none() && system.is_none() {
                ctx.store.add_entity(parent)
            } else {
                let mut draft = EntityDraft::new(name.unwrap_or_else(|| NEW_ENTITY_NAME.into()));
                if let Some(system) = system {
                    draft = draft.with_system(system);
                }
                if let Some(pid) = parent {
                    draft = draft.with_parent(pid);
                }
                ctx.store.create_entity(&draft)?
            };
            println!("Added entity {} ({})", entity.entity_id, entity.name);
            Ok(true)
        }
        Commands::Copy { id } => {
            let copy = ctx
                .store
                .copy_entity(id)
                .ok_or_else(|| anyhow!("Entity {} not found", id))?;
            println!("Copied entity {} to {} ({})", id, copy.entity_id, copy.name);
            Ok(true)
        }
        Commands::Delete { id, yes } => handle_delete(ctx, id, yes),
        Commands::Update {
            id,
            name,
            description,
            system,
            entity_type,
            parent,
            root,
        } => {
            ctx.require_entity(id)?;
            let mut patch = EntityPatch::new();
            if let Some(name) = name {
                patch = patch.with_name(name);
            }
            if let Some(description) = description {
                patch = patch.with_description(non_empty(description));
            }
            if let Some(system) = system {
                patch = patch.with_system(system);
            }
            if let Some(entity_type) = entity_type {
                patch = patch.with_type(non_empty(entity_type));
            }
            if root {
                patch = patch.with_parent(None);
            } else if let Some(pid) = parent {
                ctx.require_entity(pid)?;
                patch = patch.with_parent(Some(pid));
            }
            if patch.is_empty() {
                bail!("Nothing to update");
            }
            ctx.store.update_entity(id, &patch)?;
            println!("Updated entity {}", id);
            Ok(true)
        }
        Commands::Attr(attr) => handle_attr(ctx, attr),
        Commands::Check { fix } => {
            if fix {
                let (fixed, remaining) = ctx.store.repair();
                println!("Fixed {} record(s)", fixed);
                if !remaining.is_empty() {
                    print!("{}", render::render_report(&ctx.store.check()));
                }
                Ok(fixed > 0)
            } else {
                print!("{}", render::render_report(&ctx.store.check()));
                Ok(false)
            }
        }
        Commands::Import { path } => {
            let exts = ctx.config.import_extensions();
            let count = ctx.store.import_file(&path, &exts)?;
            println!("Imported {} entities from {}", count, path.display());
            Ok(true)
        }
        Commands::Export { out } => {
            let dir = out.unwrap_or_else(|| ctx.cwd.clone());
            let path = ctx.store.export_to(&dir, &ctx.config.export_file_name)?;
            println!("Exported to {}", path.display());
            Ok(false)
        }
    }
}

fn handle_list(ctx: &mut AppContext, system: Option<String>, search: Option<String>) {
    let mut filter = EntityFilter::default();
    if let Some(system) = system {
        let system: EntitySystem = system.parse().unwrap_or_else(|never| match never {});
        filter = filter.with_system(system);
    }
    if let Some(term) = search {
        filter = filter.with_search_term(term);
    }

    if filter.is_empty() {
        print!("{}", render::render_tree(ctx.store.entities(), None));
        return;
    }
    ctx.store.set_filter(filter);
    let visible: HashSet<EntityId> = ctx
        .store
        .filtered()
        .iter()
        .map(|e| e.entity_id)
        .collect();
    print!(
        "{}",
        render::render_tree(ctx.store.entities(), Some(&visible))
    );
}

fn handle_delete(ctx: &mut AppContext, id: EntityId, yes: bool) -> Result<bool> {
    let prompt = {
        let preview = delete::preview(ctx.store.entities(), id)
            .ok_or_else(|| anyhow!("Entity {} not found", id))?;
        render::render_delete_preview(&preview)
    };
    if !yes && !confirm(&prompt)? {
        println!("Aborted");
        return Ok(false);
    }

    let deletion = ctx.store.delete_entity(id);
    for issue in &deletion.issues {
        eprintln!("warning: {}", issue);
    }
    println!("Deleted {} entities", deletion.removed_count());
    Ok(true)
}

fn handle_attr(ctx: &mut AppContext, command: AttrCommands) -> Result<bool> {
    match command {
        AttrCommands::Add {
            entity,
            name,
            description,
            primary_key,
            system,
        } => {
            let mut draft =
                AttributeDraft::new(name.unwrap_or_else(|| NEW_ATTRIBUTE_NAME.into()))
                    .with_primary_key(PrimaryKey::from(primary_key));
            if let Some(description) = description {
                draft = draft.with_description(description);
            }
            if let Some(system) = system {
                draft = draft.with_system(system);
            }
            let attribute = ctx.store.create_attribute(entity, &draft)?;
            println!(
                "Added attribute {} ({}) to entity {}",
                attribute.attribute_id, attribute.name, entity
            );
            Ok(true)
        }
        AttrCommands::Copy { entity, attribute } => {
            let copy = ctx
                .store
                .copy_attribute(entity, attribute)
                .ok_or_else(|| {
                    anyhow!("Attribute {} not found on entity {}", attribute, entity)
                })?;
            println!(
                "Copied attribute {} to {} ({})",
                attribute, copy.attribute_id, copy.name
            );
            Ok(true)
        }
        AttrCommands::Delete { entity, attribute } => {
            if !ctx.store.delete_attribute(entity, attribute) {
                bail!("Attribute {} not found on entity {}", attribute, entity);
            }
            println!("Deleted attribute {}", attribute);
            Ok(true)
        }
        AttrCommands::Update {
            entity,
            attribute,
            name,
            description,
            primary_key,
            system,
        } => {
            let exists = ctx
                .store
                .entities()
                .get(entity)
                .and_then(|e| e.attribute(attribute))
                .is_some();
            if !exists {
                bail!("Attribute {} not found on entity {}", attribute, entity);
            }

            let mut patch = AttributePatch::new();
            if let Some(name) = name {
                patch = patch.with_name(name);
            }
            if let Some(description) = description {
                patch = patch.with_description(non_empty(description));
            }
            if let Some(flag) = primary_key {
                let flag: PrimaryKey = flag.parse().map_err(|e: String| anyhow!(e))?;
                patch = patch.with_primary_key(flag);
            }
            if let Some(system) = system {
                patch = patch.with_system(system);
            }
            if patch.is_empty() {
                bail!("Nothing to update");
            }
            ctx.store.update_attribute(entity, attribute, &patch)?;
            println!("Updated attribute {}", attribute);
            Ok(true)
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    let term = Term::stderr();
    term.write_str(&format!("{} [y/N] ", prompt))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn context() -> (tempfile::TempDir, AppContext) {
        let dir = tempdir().unwrap();
        let ctx = AppContext::open(dir.path(), None).unwrap();
        (dir, ctx)
    }

    #[test]
    fn missing_data_file_starts_empty() {
        let (dir, ctx) = context();
        assert!(ctx.store.entities().is_empty());
        assert_eq!(ctx.data_file, dir.path().join("entity_hierarchy.json"));
    }

    #[test]
    fn add_then_save_and_reopen() {
        let (dir, mut ctx) = context();
        let changed = handle(
            &mut ctx,
            Commands::Add {
                parent: None,
                name: Some("Network".into()),
                system: Some("iPen".into()),
            },
        )
        .unwrap();
        assert!(changed);
        ctx.save().unwrap();

        let reopened = AppContext::open(dir.path(), None).unwrap();
        let entity = reopened.store.entities().get(1).unwrap();
        assert_eq!(entity.name, "Network");
        assert_eq!(entity.system, "iPen");
    }

    #[test]
    fn add_under_missing_parent_fails() {
        let (_dir, mut ctx) = context();
        let result = handle(
            &mut ctx,
            Commands::Add {
                parent: Some(7),
                name: None,
                system: None,
            },
        );
        assert!(result.is_err());
        assert!(ctx.store.entities().is_empty());
    }

    #[test]
    fn update_without_fields_is_rejected() {
        let (_dir, mut ctx) = context();
        ctx.store.add_entity(None);
        let err = handle(
            &mut ctx,
            Commands::Update {
                id: 1,
                name: None,
                description: None,
                system: None,
                entity_type: None,
                parent: None,
                root: false,
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Nothing to update");
    }

    #[test]
    fn empty_description_clears() {
        assert_eq!(non_empty("  ".into()), None);
        assert_eq!(non_empty("x".into()), Some("x".into()));
    }
}
