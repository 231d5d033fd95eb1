//! Numeric id allocation.
//!
//! Ids are derived from the collection itself, never from a counter: the next id is one
//! past the largest id in use (ids below 1 are ignored). The same snapshot therefore
//! always yields the same id, which is why commits must go through the state container
//! one at a time.

use crate::model::{AttributeId, Collection, EntityId};
use tracing::warn;

/// Largest id a document may carry: the largest integer a JSON number holds exactly
/// in common producers (2^53 - 1). The codec rejects anything above it, which keeps
/// `max + 1` far from `i64::MAX`.
pub const MAX_ID: i64 = (1 << 53) - 1;

pub fn next_entity_id(collection: &Collection) -> EntityId {
    let max = collection
        .iter()
        .map(|e| e.entity_id)
        .fold(0, EntityId::max);
    one_past(max)
}

pub fn next_attribute_id(collection: &Collection) -> AttributeId {
    let max = collection
        .iter()
        .flat_map(|e| e.attributes.iter())
        .map(|a| a.attribute_id)
        .fold(0, AttributeId::max);
    one_past(max)
}

// Saturates instead of overflowing. Only reachable for collections built in code with
// ids the codec would refuse.
fn one_past(max: i64) -> i64 {
    max.checked_add(1).unwrap_or_else(|| {
        warn!(max, "id space exhausted");
        max
    })
}

/// Hands out consecutive attribute ids starting at [`next_attribute_id`].
///
/// Used when one operation creates several attributes at once (copying an entity), so
/// each new attribute gets its own id.
#[derive(Debug)]
pub struct AttributeIdAllocator {
    next: AttributeId,
}

impl AttributeIdAllocator {
    pub fn new(collection: &Collection) -> Self {
        Self {
            next: next_attribute_id(collection),
        }
    }

    pub fn allocate(&mut self) -> AttributeId {
        let id = self.next;
        self.next = one_past(self.next);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attribute, Entity};

    fn entity_with_attrs(id: EntityId, attr_ids: &[AttributeId]) -> Entity {
        let mut entity = Entity::new(id, format!("E{}", id), None, 1);
        entity.attributes = attr_ids
            .iter()
            .map(|a| Attribute::new(*a, format!("A{}", a), &entity))
            .collect();
        entity
    }

    #[test]
    fn empty_collection_starts_at_one() {
        let empty = Collection::default();
        assert_eq!(next_entity_id(&empty), 1);
        assert_eq!(next_attribute_id(&empty), 1);
    }

    #[test]
    fn next_entity_id_is_one_past_max() {
        let collection = Collection::new(vec![
            entity_with_attrs(5, &[]),
            entity_with_attrs(2, &[]),
        ]);
        assert_eq!(next_entity_id(&collection), 6);
    }

    #[test]
    fn next_attribute_id_scans_every_entity() {
        let collection = Collection::new(vec![
            entity_with_attrs(1, &[10, 11]),
            entity_with_attrs(2, &[10_000]),
            entity_with_attrs(3, &[]),
        ]);
        assert_eq!(next_attribute_id(&collection), 10_001);
    }

    #[test]
    fn negative_ids_do_not_lower_the_floor() {
        let collection = Collection::new(vec![entity_with_attrs(-4, &[-2])]);
        assert_eq!(next_entity_id(&collection), 1);
        assert_eq!(next_attribute_id(&collection), 1);
    }

    #[test]
    fn allocation_is_pure() {
        let collection = Collection::new(vec![entity_with_attrs(3, &[8])]);
        assert_eq!(next_entity_id(&collection), next_entity_id(&collection));
        assert_eq!(next_attribute_id(&collection), 9);
    }

    #[test]
    fn allocation_at_the_top_of_the_range_does_not_overflow() {
        let collection = Collection::new(vec![entity_with_attrs(i64::MAX, &[i64::MAX])]);
        assert_eq!(next_entity_id(&collection), i64::MAX);
        let mut allocator = AttributeIdAllocator::new(&collection);
        assert_eq!(allocator.allocate(), i64::MAX);
        assert_eq!(allocator.allocate(), i64::MAX);
    }

    #[test]
    fn largest_document_id_still_allocates() {
        let collection = Collection::new(vec![entity_with_attrs(MAX_ID, &[MAX_ID])]);
        assert_eq!(next_entity_id(&collection), MAX_ID + 1);
        assert_eq!(next_attribute_id(&collection), MAX_ID + 1);
    }

    #[test]
    fn allocator_hands_out_consecutive_ids() {
        let collection = Collection::new(vec![entity_with_attrs(1, &[4])]);
        let mut allocator = AttributeIdAllocator::new(&collection);
        assert_eq!(allocator.allocate(), 5);
        assert_eq!(allocator.allocate(), 6);
        assert_eq!(allocator.allocate(), 7);
    }
}
