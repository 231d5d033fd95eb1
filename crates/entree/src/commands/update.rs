use crate::error::{EntreeError, Result};
use crate::model::{AttributeId, Collection, EntityId, PrimaryKey};
use crate::tree;
use tracing::debug;

/// Partial update for an entity. `None` leaves a field alone.
///
/// Optional fields take a nested `Option` so they can be cleared:
/// `description: Some(None)` removes the description, `parent_id: Some(None)` turns
/// the entity into a root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub system: Option<String>,
    pub entity_type: Option<Option<String>>,
    pub parent_id: Option<Option<EntityId>>,
}

impl EntityPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_type(mut self, entity_type: Option<String>) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    pub fn with_parent(mut self, parent_id: Option<EntityId>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.system.is_none()
            && self.entity_type.is_none()
            && self.parent_id.is_none()
    }
}

/// Applies a patch to one entity.
///
/// Only the supplied fields change. A new parent moves the entity together with its
/// subtree: both parents' child lists are reconciled and the levels below the entity
/// are recomputed. Moving an entity under itself or one of its descendants fails with
/// [`EntreeError::Integrity`]. An unknown id returns the collection unchanged.
pub fn update_entity(
    collection: &Collection,
    entity_id: EntityId,
    patch: &EntityPatch,
) -> Result<Collection> {
    let Some(current) = collection.get(entity_id) else {
        debug!(entity_id, "update: entity not found");
        return Ok(collection.clone());
    };
    if matches!(&patch.name, Some(name) if name.trim().is_empty()) {
        return Err(EntreeError::Validation("Entity name is required".to_string()));
    }

    let old_parent = current.parent_id;
    // 0 is the wire format's "no parent"
    let new_parent = patch.parent_id.map(|p| p.filter(|id| *id != 0));
    if let Some(Some(target)) = new_parent {
        if target == entity_id || tree::is_descendant_of(collection, target, entity_id) {
            return Err(EntreeError::Integrity(format!(
                "Cannot move entity {} under {}: it would become its own ancestor",
                entity_id, target
            )));
        }
    }

    let mut next = collection.clone();
    let Some(entity) = next.get_mut(entity_id) else {
        return Ok(next);
    };
    if let Some(name) = &patch.name {
        entity.name = name.clone();
    }
    if let Some(description) = &patch.description {
        entity.description = description.clone();
    }
    if let Some(system) = &patch.system {
        entity.system = system.clone();
    }
    if let Some(entity_type) = &patch.entity_type {
        entity.entity_type = entity_type.clone();
    }

    match new_parent {
        Some(parent) if parent != old_parent => {
            entity.parent_id = parent;
            if let Some(pid) = old_parent {
                tree::reconcile_children(&mut next, pid);
            }
            if let Some(pid) = parent {
                tree::reconcile_children(&mut next, pid);
            }
            let relevelled = tree::relevel_subtree(&mut next, entity_id);
            debug!(entity_id, ?old_parent, new_parent = ?parent, relevelled, "entity moved");
        }
        _ => debug!(entity_id, "entity updated"),
    }
    Ok(next)
}

/// Partial update for an attribute. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub primary_key: Option<PrimaryKey>,
    pub system: Option<String>,
}

impl AttributePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_primary_key(mut self, primary_key: PrimaryKey) -> Self {
        self.primary_key = Some(primary_key);
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.primary_key.is_none()
            && self.system.is_none()
    }
}

/// Applies a patch to one attribute. Unknown ids leave the collection unchanged; a
/// blank name fails with [`EntreeError::Validation`].
pub fn update_attribute(
    collection: &Collection,
    entity_id: EntityId,
    attribute_id: AttributeId,
    patch: &AttributePatch,
) -> Result<Collection> {
    if matches!(&patch.name, Some(name) if name.trim().is_empty()) {
        return Err(EntreeError::Validation("Attribute name is required".to_string()));
    }
    let mut next = collection.clone();
    let Some(attr) = next
        .get_mut(entity_id)
        .and_then(|e| e.attributes.iter_mut().find(|a| a.attribute_id == attribute_id))
    else {
        debug!(entity_id, attribute_id, "update: attribute not found");
        return Ok(next);
    };

    if let Some(name) = &patch.name {
        attr.name = name.clone();
    }
    if let Some(description) = &patch.description {
        attr.description = description.clone();
    }
    if let Some(primary_key) = patch.primary_key {
        attr.primary_key = primary_key;
    }
    if let Some(system) = &patch.system {
        attr.system = system.clone();
    }
    debug!(entity_id, attribute_id, "attribute updated");
    Ok(next)
}
