use crate::error::{EntreeError, Result};
use crate::ids::{next_attribute_id, next_entity_id};
use crate::model::{Attribute, Collection, Entity, EntityId};
use crate::tree;
use crate::validation::{validate_attribute, validate_entity, AttributeDraft, EntityDraft};
use tracing::{debug, warn};

pub const NEW_ENTITY_NAME: &str = "New Entity";
pub const NEW_ATTRIBUTE_NAME: &str = "New Attribute";

/// Adds a placeholder entity under `parent_id` (or as a root).
///
/// A parent id that names no entity is kept as given; the new entity is then levelled
/// like a root.
pub fn add_entity(collection: &Collection, parent_id: Option<EntityId>) -> (Entity, Collection) {
    let entity_id = next_entity_id(collection);
    let level = level_for_new_child(collection, entity_id, parent_id);
    let entity = Entity::new(entity_id, NEW_ENTITY_NAME, parent_id, level);

    let next = insert(collection, entity.clone());
    debug!(entity_id, ?parent_id, level, "entity added");
    (entity, next)
}

/// Builds an entity from a draft, validates it, and only then adds it.
pub fn create_entity(collection: &Collection, draft: &EntityDraft) -> Result<(Entity, Collection)> {
    draft.validate()?;

    let entity_id = next_entity_id(collection);
    let level = level_for_new_child(collection, entity_id, draft.parent_id);
    let mut entity = Entity::new(entity_id, draft.name.trim(), draft.parent_id, level);
    entity.description = draft.description.clone();
    entity.system = draft.system_or_default().to_string();
    entity.entity_type = draft.entity_type.clone();
    validate_entity(&entity)?;

    let next = insert(collection, entity.clone());
    debug!(entity_id, name = %entity.name, "entity created from draft");
    Ok((entity, next))
}

/// Adds a placeholder attribute to an entity. `None` when the entity does not exist.
pub fn add_attribute(
    collection: &Collection,
    entity_id: EntityId,
) -> Option<(Attribute, Collection)> {
    let owner = collection.get(entity_id)?;
    let attribute = Attribute::new(next_attribute_id(collection), NEW_ATTRIBUTE_NAME, owner);
    let next = append_attribute(collection, entity_id, attribute.clone());
    debug!(entity_id, attribute_id = attribute.attribute_id, "attribute added");
    Some((attribute, next))
}

/// Builds an attribute from a draft and adds it to the entity.
///
/// Unlike the other commands, a missing owner is an error here: the draft would be
/// lost silently otherwise.
pub fn create_attribute(
    collection: &Collection,
    entity_id: EntityId,
    draft: &AttributeDraft,
) -> Result<(Attribute, Collection)> {
    draft.validate()?;
    let owner = collection.get(entity_id).ok_or_else(|| {
        EntreeError::Validation(format!("Entity {} does not exist", entity_id))
    })?;

    let mut attribute = Attribute::new(next_attribute_id(collection), draft.name.trim(), owner);
    attribute.description = draft.description.clone();
    attribute.primary_key = draft.primary_key;
    if let Some(system) = &draft.system {
        attribute.system = system.clone();
    }
    validate_attribute(&attribute)?;

    let next = append_attribute(collection, entity_id, attribute.clone());
    debug!(entity_id, attribute_id = attribute.attribute_id, "attribute created from draft");
    Ok((attribute, next))
}

fn level_for_new_child(
    collection: &Collection,
    entity_id: EntityId,
    parent_id: Option<EntityId>,
) -> u32 {
    if let Some(pid) = parent_id {
        if !collection.contains(pid) {
            warn!(entity_id, parent_id = pid, "parent not found, levelling as root");
        }
    }
    tree::level_under(collection, parent_id)
}

/// Appends the entity and registers it with its parent, if the parent exists.
pub(crate) fn insert(collection: &Collection, entity: Entity) -> Collection {
    let parent_id = entity.parent_id;
    let mut next = collection.clone();
    next.push(entity);
    if let Some(pid) = parent_id {
        tree::reconcile_children(&mut next, pid);
    }
    next
}

pub(crate) fn append_attribute(
    collection: &Collection,
    entity_id: EntityId,
    attribute: Attribute,
) -> Collection {
    let mut next = collection.clone();
    if let Some(owner) = next.get_mut(entity_id) {
        owner.attributes.push(attribute);
    }
    next
}
