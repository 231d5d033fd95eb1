use super::add::{append_attribute, insert};
use super::COPY_SUFFIX;
use crate::ids::{next_attribute_id, next_entity_id, AttributeIdAllocator};
use crate::model::{Attribute, AttributeId, Collection, Entity, EntityId, Identity};
use tracing::debug;

/// Copies an entity next to the original (same parent).
///
/// The copy is shallow with respect to the tree: children are not copied and the
/// copy starts with an empty child list. Attributes are copied, each with its own
/// fresh collection-wide id. `None` when the entity does not exist.
pub fn copy_entity(collection: &Collection, entity_id: EntityId) -> Option<(Entity, Collection)> {
    let source = collection.get(entity_id)?;
    let new_id = next_entity_id(collection);
    let mut allocator = AttributeIdAllocator::new(collection);

    let attributes = source
        .attributes
        .iter()
        .map(|attr| Attribute {
            identity: Identity::new(),
            attribute_id: allocator.allocate(),
            parent_id: new_id,
            ..attr.clone()
        })
        .collect();

    let copy = Entity {
        identity: Identity::new(),
        entity_id: new_id,
        name: format!("{}{}", source.name, COPY_SUFFIX),
        child_ids: Vec::new(),
        attributes,
        ..source.clone()
    };

    let next = insert(collection, copy.clone());
    debug!(source = entity_id, copy = new_id, "entity copied");
    Some((copy, next))
}

/// Copies an attribute within its entity. `None` when either id does not exist.
pub fn copy_attribute(
    collection: &Collection,
    entity_id: EntityId,
    attribute_id: AttributeId,
) -> Option<(Attribute, Collection)> {
    let source = collection.get(entity_id)?.attribute(attribute_id)?;
    let copy = Attribute {
        identity: Identity::new(),
        attribute_id: next_attribute_id(collection),
        name: format!("{}{}", source.name, COPY_SUFFIX),
        ..source.clone()
    };

    let next = append_attribute(collection, entity_id, copy.clone());
    debug!(entity_id, source = attribute_id, copy = copy.attribute_id, "attribute copied");
    Some((copy, next))
}
