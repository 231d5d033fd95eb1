//! # CLI Behavior
//!
//! This is **one possible UI client** for entree, not the application itself.
//! The CLI is the only place that knows about terminal I/O, exit codes, and output formatting.
//!
//! For the overall architecture, see the crate-level documentation in [`crate`].
//!
//! ## The Data File
//!
//! Every invocation loads one document (`entity_hierarchy.json` by default, see
//! `entree.toml` or `--file`), applies a single command and writes the document back
//! when the command changed it. A missing file is an empty hierarchy.
//!
//! ### Naked Execution (`entree`)
//!
//! Running `entree` with no arguments defaults to `entree list`.
//!
//! ### Search vs. List
//!
//! - `entree search <query>`: matches across entity and attribute fields, reports the
//!   field that matched.
//! - `entree list --system <name> --search <term>`: the filtered tree view.
//!
//! ### Destructive Commands
//!
//! `entree delete <id>` removes the whole subtree. It previews what will go and asks
//! for confirmation unless `--yes` is given.
//!
//! ## Module Structure
//!
//! - `commands`: Context setup and per-command handlers
//! - `render`: Output formatting (tree, details, reports)
//! - `setup`: Argument parsing via clap

mod commands;
mod render;
pub mod setup;

pub use commands::run;
