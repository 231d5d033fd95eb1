//! # Entree
//!
//! Entree is an engine for **entity hierarchies**: forests of schema-like records
//! (entities) that own ordered lists of fields (attributes), each tagged with the
//! subsystem that owns it.
//!
//! ## Architecture
//!
//! The crate is UI-agnostic. Layers, leaves first:
//!
//! | Layer | Module | Role |
//! |-------|--------|------|
//! | Types | [`model`] | `Entity`, `Attribute`, `Collection`, filter vocabulary |
//! | Ids | [`ids`] | next free entity and attribute ids |
//! | Tree | [`tree`] | derived child index, subtree walks, relevelling |
//! | Commands | [`commands`] | pure operations: `&Collection` in, new `Collection` out |
//! | Codec | [`codec`] | JSON document ⇄ `Collection` |
//! | State | [`store`] | the committed snapshot plus view state |
//!
//! [`validation`] checks records built from user input, [`io`] owns the file boundary
//! and [`config`] the layered settings.
//!
//! ## Invariants
//!
//! `parent_id` is the source of truth for the tree. Every command leaves `child_ids`
//! and `hierarchy_level` consistent with it for the entities it touches; documents
//! from elsewhere can be brought in line with [`commands::repair`].
//!
//! ## Example
//!
//! ```
//! use entree::store::EntityStore;
//!
//! let mut store = EntityStore::new();
//! let root = store.add_entity(None);
//! let child = store.add_entity(Some(root.entity_id));
//! assert_eq!(child.hierarchy_level, 2);
//!
//! let document = store.export().unwrap();
//! assert!(document.contains("\"Entity child ID\": [\n      2\n    ]"));
//! ```

pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod ids;
pub mod io;
pub mod model;
pub mod store;
pub mod tree;
pub mod validation;

pub use error::{EntreeError, ParseError, Result};
