//! # Command Layer
//!
//! This module contains the **core business logic** of entree: every operation that
//! creates, copies, deletes, updates or searches entities and attributes.
//!
//! ## Pure Functions over Snapshots
//!
//! Every command takes a `&Collection` and returns a **new** collection (or a value
//! derived from one). The input is never touched. This is what lets the state
//! container ([`crate::store`]) treat a committed collection as an immutable snapshot
//! and swap it wholesale on every commit.
//!
//! ## Missing Ids Are Not Errors
//!
//! Callers routinely act on stale selections (the user deleted the entity in another
//! panel a moment ago). Commands therefore treat an unknown id as a no-op or return
//! `None`; they only return `Err` for requests that would corrupt the tree (moving an
//! entity under its own descendant) or that fail validation.
//!
//! ## What Commands Do NOT Do
//!
//! - **Confirmation**: deletes are immediate. Use [`delete::preview`] to ask first.
//! - **I/O**: reading and writing documents lives in [`crate::io`] and [`crate::codec`].
//!
//! ## Command Modules
//!
//! - [`add`]: new entities and attributes, from defaults or from validated drafts
//! - [`copy`]: shallow entity copies (attributes included, children not)
//! - [`delete`]: cascading entity delete, attribute delete
//! - [`update`]: partial updates, including re-parenting
//! - [`search`]: substring search and view filtering
//! - [`check`]: integrity report and repair

pub mod add;
pub mod check;
pub mod copy;
pub mod delete;
pub mod search;
pub mod update;

pub use add::{add_attribute, add_entity, create_attribute, create_entity};
pub use check::{check, repair, IntegrityIssue, IntegrityReport, Repair};
pub use copy::{copy_attribute, copy_entity};
pub use delete::{delete_attribute, delete_entity, DeletePreview, Deletion};
pub use search::{apply_filter, matches_system, search, search_hits, MatchedField, SearchHit};
pub use update::{update_attribute, update_entity, AttributePatch, EntityPatch};

/// Suffix appended to the name of copied entities and attributes.
pub const COPY_SUFFIX: &str = " (Copy)";
