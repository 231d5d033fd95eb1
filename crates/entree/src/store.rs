//! # State Container
//!
//! [`EntityStore`] is the single entry point a UI talks to. It owns:
//!
//! - the **committed snapshot**: an `Arc<Collection>` that is replaced, never mutated,
//! - transient view state: the `loading` flag, the last error message and the
//!   current [`EntityFilter`].
//!
//! ## Commits
//!
//! Every operation computes a new collection with a pure function from
//! [`crate::commands`] and then swaps it in. Operations take `&mut self`, so two of
//! them can never both start from the same stale snapshot; the id allocator relies on
//! this. Readers holding an older `Arc` keep a consistent view until they drop it.
//!
//! ## Two Ways In
//!
//! Operations are exposed twice:
//! - as **facade methods** (`add_entity`, `delete_entity`, ...) returning typed results,
//! - as a [`Command`] value passed to [`EntityStore::dispatch`], for callers that
//!   queue or replay operations (a UI event loop, tests).
//!
//! ## Imports Are All-or-Nothing
//!
//! A failed import records the message in `error`, clears `loading` and leaves the
//! committed collection untouched.

use crate::codec;
use crate::commands::{self, AttributePatch, EntityPatch, IntegrityIssue, IntegrityReport};
use crate::error::{EntreeError, Result};
use crate::io;
use crate::model::{Attribute, AttributeId, Collection, Entity, EntityFilter, EntityId};
use crate::validation::{AttributeDraft, EntityDraft};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything a view needs to render.
#[derive(Debug, Clone, Default)]
pub struct EntityState {
    pub entities: Arc<Collection>,
    pub loading: bool,
    pub error: Option<String>,
    pub filter: EntityFilter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddEntity {
        parent_id: Option<EntityId>,
    },
    CreateEntity(EntityDraft),
    CopyEntity {
        entity_id: EntityId,
    },
    DeleteEntity {
        entity_id: EntityId,
    },
    UpdateEntity {
        entity_id: EntityId,
        patch: EntityPatch,
    },
    AddAttribute {
        entity_id: EntityId,
    },
    CreateAttribute {
        entity_id: EntityId,
        draft: AttributeDraft,
    },
    CopyAttribute {
        entity_id: EntityId,
        attribute_id: AttributeId,
    },
    DeleteAttribute {
        entity_id: EntityId,
        attribute_id: AttributeId,
    },
    UpdateAttribute {
        entity_id: EntityId,
        attribute_id: AttributeId,
        patch: AttributePatch,
    },
    Repair,
    SetEntities(Collection),
    SetLoading(bool),
    SetError(Option<String>),
    SetFilter(EntityFilter),
}

/// What a dispatched command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The target did not exist; nothing was committed.
    NotFound,
    EntityAdded(Entity),
    AttributeAdded(Attribute),
    EntitiesRemoved {
        removed: Vec<EntityId>,
        issues: Vec<IntegrityIssue>,
    },
    AttributeRemoved,
    Updated,
    Repaired {
        fixed: usize,
        remaining: Vec<IntegrityIssue>,
    },
    StateChanged,
}

#[derive(Debug, Default)]
pub struct EntityStore {
    state: EntityState,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(collection: Collection) -> Self {
        let mut store = Self::new();
        store.commit(collection);
        store
    }

    pub fn state(&self) -> &EntityState {
        &self.state
    }

    pub fn entities(&self) -> &Collection {
        &self.state.entities
    }

    /// A shared handle to the committed snapshot.
    pub fn snapshot(&self) -> Arc<Collection> {
        Arc::clone(&self.state.entities)
    }

    /// The committed collection seen through the current filter.
    pub fn filtered(&self) -> Vec<&Entity> {
        commands::apply_filter(&self.state.entities, &self.state.filter)
    }

    pub fn loading(&self) -> bool {
        self.state.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn filter(&self) -> &EntityFilter {
        &self.state.filter
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        debug!(?command, "dispatch");
        let outcome = match command {
            Command::AddEntity { parent_id } => Outcome::EntityAdded(self.add_entity(parent_id)),
            Command::CreateEntity(draft) => Outcome::EntityAdded(self.create_entity(&draft)?),
            Command::CopyEntity { entity_id } => self
                .copy_entity(entity_id)
                .map_or(Outcome::NotFound, Outcome::EntityAdded),
            Command::DeleteEntity { entity_id } => {
                let deletion = self.delete_entity(entity_id);
                if deletion.removed.is_empty() {
                    Outcome::NotFound
                } else {
                    Outcome::EntitiesRemoved {
                        removed: deletion.removed,
                        issues: deletion.issues,
                    }
                }
            }
            Command::UpdateEntity { entity_id, patch } => {
                if !self.entities().contains(entity_id) {
                    return Ok(Outcome::NotFound);
                }
                self.update_entity(entity_id, &patch)?;
                Outcome::Updated
            }
            Command::AddAttribute { entity_id } => self
                .add_attribute(entity_id)
                .map_or(Outcome::NotFound, Outcome::AttributeAdded),
            Command::CreateAttribute { entity_id, draft } => {
                Outcome::AttributeAdded(self.create_attribute(entity_id, &draft)?)
            }
            Command::CopyAttribute {
                entity_id,
                attribute_id,
            } => self
                .copy_attribute(entity_id, attribute_id)
                .map_or(Outcome::NotFound, Outcome::AttributeAdded),
            Command::DeleteAttribute {
                entity_id,
                attribute_id,
            } => {
                if self.delete_attribute(entity_id, attribute_id) {
                    Outcome::AttributeRemoved
                } else {
                    Outcome::NotFound
                }
            }
            Command::UpdateAttribute {
                entity_id,
                attribute_id,
                patch,
            } => {
                let exists = self
                    .entities()
                    .get(entity_id)
                    .and_then(|e| e.attribute(attribute_id))
                    .is_some();
                if !exists {
                    return Ok(Outcome::NotFound);
                }
                self.update_attribute(entity_id, attribute_id, &patch)?;
                Outcome::Updated
            }
            Command::Repair => {
                let (fixed, remaining) = self.repair();
                Outcome::Repaired { fixed, remaining }
            }
            Command::SetEntities(collection) => {
                self.set_entities(collection);
                Outcome::StateChanged
            }
            Command::SetLoading(loading) => {
                self.set_loading(loading);
                Outcome::StateChanged
            }
            Command::SetError(error) => {
                self.set_error(error);
                Outcome::StateChanged
            }
            Command::SetFilter(filter) => {
                self.set_filter(filter);
                Outcome::StateChanged
            }
        };
        Ok(outcome)
    }

    pub fn add_entity(&mut self, parent_id: Option<EntityId>) -> Entity {
        let (entity, next) = commands::add_entity(&self.state.entities, parent_id);
        self.commit(next);
        entity
    }

    /// Validates the draft and commits only on success.
    pub fn create_entity(&mut self, draft: &EntityDraft) -> Result<Entity> {
        let (entity, next) = commands::create_entity(&self.state.entities, draft)?;
        self.commit(next);
        Ok(entity)
    }

    pub fn copy_entity(&mut self, entity_id: EntityId) -> Option<Entity> {
        let (copy, next) = commands::copy_entity(&self.state.entities, entity_id)?;
        self.commit(next);
        Some(copy)
    }

    /// Cascading delete. Confirmation is the caller's job; see
    /// [`commands::delete::preview`].
    pub fn delete_entity(&mut self, entity_id: EntityId) -> commands::Deletion {
        let deletion = commands::delete_entity(&self.state.entities, entity_id);
        if !deletion.removed.is_empty() {
            self.commit(deletion.collection.clone());
        }
        deletion
    }

    pub fn update_entity(&mut self, entity_id: EntityId, patch: &EntityPatch) -> Result<()> {
        let next = commands::update_entity(&self.state.entities, entity_id, patch)?;
        self.commit(next);
        Ok(())
    }

    pub fn add_attribute(&mut self, entity_id: EntityId) -> Option<Attribute> {
        let (attribute, next) = commands::add_attribute(&self.state.entities, entity_id)?;
        self.commit(next);
        Some(attribute)
    }

    pub fn create_attribute(
        &mut self,
        entity_id: EntityId,
        draft: &AttributeDraft,
    ) -> Result<Attribute> {
        let (attribute, next) =
            commands::create_attribute(&self.state.entities, entity_id, draft)?;
        self.commit(next);
        Ok(attribute)
    }

    pub fn copy_attribute(
        &mut self,
        entity_id: EntityId,
        attribute_id: AttributeId,
    ) -> Option<Attribute> {
        let (copy, next) =
            commands::copy_attribute(&self.state.entities, entity_id, attribute_id)?;
        self.commit(next);
        Some(copy)
    }

    /// Returns false when the entity or attribute does not exist.
    pub fn delete_attribute(&mut self, entity_id: EntityId, attribute_id: AttributeId) -> bool {
        match commands::delete_attribute(&self.state.entities, entity_id, attribute_id) {
            Some(next) => {
                self.commit(next);
                true
            }
            None => false,
        }
    }

    pub fn update_attribute(
        &mut self,
        entity_id: EntityId,
        attribute_id: AttributeId,
        patch: &AttributePatch,
    ) -> Result<()> {
        let next =
            commands::update_attribute(&self.state.entities, entity_id, attribute_id, patch)?;
        self.commit(next);
        Ok(())
    }

    pub fn search(&self, query: &str) -> Vec<&Entity> {
        commands::search(&self.state.entities, query)
    }

    pub fn check(&self) -> IntegrityReport {
        commands::check(&self.state.entities)
    }

    /// Repairs derived fields and returns (records fixed, issues left).
    pub fn repair(&mut self) -> (usize, Vec<IntegrityIssue>) {
        let repair = commands::repair(&self.state.entities);
        if repair.fixed > 0 {
            self.commit(repair.collection);
        }
        (repair.fixed, repair.remaining)
    }

    pub fn set_entities(&mut self, collection: Collection) {
        self.commit(collection);
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.state.loading = loading;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.state.error = error;
    }

    pub fn set_filter(&mut self, filter: EntityFilter) {
        self.state.filter = filter;
    }

    /// Replaces the collection with a parsed document. Returns the entity count.
    pub fn import_text(&mut self, text: &str) -> Result<usize> {
        self.state.loading = true;
        let parsed = codec::parse(text).map_err(EntreeError::from);
        self.finish_import(parsed)
    }

    /// Reads, checks and imports a file. Non-JSON files are refused before reading.
    pub fn import_file(&mut self, path: &Path, accepted_exts: &[String]) -> Result<usize> {
        self.state.loading = true;
        let parsed = io::read_collection(path, accepted_exts);
        self.finish_import(parsed)
    }

    fn finish_import(&mut self, parsed: Result<Collection>) -> Result<usize> {
        self.state.loading = false;
        match parsed {
            Ok(collection) => {
                let count = collection.len();
                self.commit(collection);
                self.state.error = None;
                info!(entities = count, "import committed");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "import failed, keeping current collection");
                self.state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// The current collection as an export document.
    pub fn export(&self) -> Result<String> {
        codec::serialize(&self.state.entities)
    }

    pub fn export_to(&self, dir: &Path, file_name: &str) -> Result<PathBuf> {
        io::write_export(&self.state.entities, dir, file_name)
    }

    fn commit(&mut self, collection: Collection) {
        self.state.entities = Arc::new(collection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntitySystem;

    fn seeded() -> EntityStore {
        let mut store = EntityStore::new();
        let root = store.add_entity(None);
        store.add_entity(Some(root.entity_id));
        store
    }

    #[test]
    fn commits_replace_the_snapshot() {
        let mut store = seeded();
        let before = store.snapshot();
        store.add_entity(None);
        assert_eq!(before.len(), 2);
        assert_eq!(store.entities().len(), 3);
    }

    #[test]
    fn dispatch_reports_not_found() {
        let mut store = seeded();
        let before = store.snapshot();
        let outcome = store
            .dispatch(Command::CopyEntity { entity_id: 42 })
            .unwrap();
        assert_eq!(outcome, Outcome::NotFound);
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn dispatch_delete_cascades() {
        let mut store = seeded();
        let outcome = store
            .dispatch(Command::DeleteEntity { entity_id: 1 })
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::EntitiesRemoved {
                removed: vec![1, 2],
                issues: vec![]
            }
        );
        assert!(store.entities().is_empty());
    }

    #[test]
    fn create_entity_validation_blocks_commit() {
        let mut store = seeded();
        let err = store
            .create_entity(&EntityDraft::new("X").with_system("Mainframe"))
            .unwrap_err();
        assert!(matches!(err, EntreeError::Validation(_)));
        assert_eq!(store.entities().len(), 2);
    }

    #[test]
    fn filtered_view_follows_filter() {
        let mut store = seeded();
        store
            .update_entity(1, &EntityPatch::new().with_system("EAM"))
            .unwrap();
        store.set_filter(EntityFilter::default().with_system(EntitySystem::Eam));
        let ids: Vec<_> = store.filtered().iter().map(|e| e.entity_id).collect();
        assert_eq!(ids, vec![1]);

        store.set_filter(EntityFilter::default());
        assert_eq!(store.filtered().len(), 2);
    }

    #[test]
    fn failed_import_keeps_collection_and_records_error() {
        let mut store = seeded();
        let before = store.snapshot();
        let err = store.import_text(r#"{"not": "an array"}"#).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid JSON format: Expected an array of entities"
        );
        assert_eq!(
            store.error(),
            Some("Invalid JSON format: Expected an array of entities")
        );
        assert!(!store.loading());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn successful_import_replaces_collection_and_clears_error() {
        let mut store = seeded();
        store.set_error(Some("old".to_string()));
        let count = store
            .import_text(r#"[{"Entity ID": 9, "Entity Name": "Imported"}]"#)
            .unwrap();
        assert_eq!(count, 1);
        assert!(store.error().is_none());
        assert_eq!(store.entities().get(9).unwrap().name, "Imported");
    }

    #[test]
    fn update_attribute_via_dispatch() {
        let mut store = seeded();
        let attr = store.add_attribute(2).unwrap();
        let outcome = store
            .dispatch(Command::UpdateAttribute {
                entity_id: 2,
                attribute_id: attr.attribute_id,
                patch: AttributePatch::new().with_name("Key"),
            })
            .unwrap();
        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(store.entities().get(2).unwrap().attributes[0].name, "Key");
    }

    #[test]
    fn blank_attribute_name_keeps_snapshot() {
        let mut store = seeded();
        let attr = store.add_attribute(2).unwrap();
        let before = store.snapshot();
        let result = store.dispatch(Command::UpdateAttribute {
            entity_id: 2,
            attribute_id: attr.attribute_id,
            patch: AttributePatch::new().with_name(""),
        });
        assert!(matches!(result, Err(EntreeError::Validation(_))));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
        assert!(store.export().is_ok_and(|doc| codec::parse(&doc).is_ok()));
    }

    #[test]
    fn repair_without_changes_keeps_snapshot() {
        let mut store = seeded();
        let before = store.snapshot();
        assert_eq!(store.repair(), (0, vec![]));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }
}
