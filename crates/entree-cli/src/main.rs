//! # Entree CLI Architecture
//!
//! Entree ships with a command line client, but the binary is intentionally thin:
//! the CLI lives in `src/cli/`, while this file only invokes `cli::run()` and
//! handles process termination.
//!
//! ## Workspace Structure
//!
//! Entree is organized as a Cargo workspace with two crates:
//! - `crates/entree/`: Core library with UI-agnostic hierarchy logic
//! - `crates/entree-cli/`: This CLI tool, depends on the `entree` library
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/entree-cli/src/cli/)                     │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Context wiring, load/save of the document (commands.rs)  │
//! │  - Terminal rendering with console styles (render.rs)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  State Layer (crates/entree/src/store.rs)                   │
//! │  - Holds the committed collection snapshot                  │
//! │  - Dispatches to command modules, tracks view state         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (crates/entree/src/commands/*)               │
//! │  - Pure tree operations on `Collection` values              │
//! │  - No knowledge of stdout/stderr or process exits           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything from `store.rs` inward is UI agnostic. The CLI layer owns all
//! user-facing concerns: argument parsing, reading and writing the data file,
//! confirmation prompts, error reporting and rendering.
//!
//! ## Testing Approach
//!
//! - **Commands layer**: unit tests next to each operation.
//! - **Library integration**: `crates/entree/tests/` drives the store end to end.
//! - **CLI layer**: `tests/cli.rs` runs the binary against a temporary data file.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
