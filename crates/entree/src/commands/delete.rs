use super::check::IntegrityIssue;
use crate::model::{AttributeId, Collection, Entity, EntityId};
use crate::tree::{self, ChildIndex};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, warn};

/// Result of a cascading delete.
#[derive(Debug, Clone)]
pub struct Deletion {
    pub collection: Collection,
    /// The target followed by its descendants, breadth first. Empty when the target
    /// did not exist.
    pub removed: Vec<EntityId>,
    /// Problems met during the walk (cycles). The delete still completes.
    pub issues: Vec<IntegrityIssue>,
}

impl Deletion {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// What a delete would remove, for confirmation prompts.
#[derive(Debug, Clone)]
pub struct DeletePreview<'a> {
    pub target: &'a Entity,
    pub descendant_count: usize,
    pub attribute_count: usize,
    pub revisited: Vec<EntityId>,
}

pub fn preview(collection: &Collection, entity_id: EntityId) -> Option<DeletePreview<'_>> {
    let target = collection.get(entity_id)?;
    let (ids, revisited) = cascade(collection, entity_id);
    let attribute_count = ids
        .iter()
        .filter_map(|id| collection.get(*id))
        .map(|e| e.attributes.len())
        .sum();

    Some(DeletePreview {
        target,
        descendant_count: ids.len() - 1,
        attribute_count,
        revisited,
    })
}

/// Removes an entity, every descendant and all their attributes.
///
/// Descendants are found through both the parent index and the stored `child_ids`,
/// each id visited once. Removed ids are stripped from every remaining child list.
pub fn delete_entity(collection: &Collection, entity_id: EntityId) -> Deletion {
    let Some(target) = collection.get(entity_id) else {
        debug!(entity_id, "delete: entity not found");
        return Deletion {
            collection: collection.clone(),
            removed: Vec::new(),
            issues: Vec::new(),
        };
    };
    let parent_id = target.parent_id;

    let (removed, revisited) = cascade(collection, entity_id);
    let issues: Vec<IntegrityIssue> = revisited
        .into_iter()
        .map(|id| IntegrityIssue::Cycle { entity_id: id })
        .collect();
    for issue in &issues {
        warn!(%issue, "cycle found while deleting");
    }

    let doomed: HashSet<EntityId> = removed.iter().copied().collect();
    let mut next: Collection = collection
        .iter()
        .filter(|e| !doomed.contains(&e.entity_id))
        .cloned()
        .collect();
    for entity in next.entities_mut().iter_mut() {
        entity.child_ids.retain(|id| !doomed.contains(id));
    }
    if let Some(pid) = parent_id {
        tree::reconcile_children(&mut next, pid);
    }

    debug!(entity_id, removed = removed.len(), "entity deleted");
    Deletion {
        collection: next,
        removed,
        issues,
    }
}

/// Removes one attribute. `None` when the entity or the attribute does not exist.
pub fn delete_attribute(
    collection: &Collection,
    entity_id: EntityId,
    attribute_id: AttributeId,
) -> Option<Collection> {
    collection.get(entity_id)?.attribute(attribute_id)?;

    let mut next = collection.clone();
    if let Some(owner) = next.get_mut(entity_id) {
        owner.attributes.retain(|a| a.attribute_id != attribute_id);
    }
    debug!(entity_id, attribute_id, "attribute deleted");
    Some(next)
}

/// Target first, then descendants. Second value lists ids reached more than once.
fn cascade(collection: &Collection, entity_id: EntityId) -> (Vec<EntityId>, Vec<EntityId>) {
    let index = ChildIndex::build(collection);
    let mut order = vec![entity_id];
    let mut revisited = Vec::new();
    let mut visited = HashSet::from([entity_id]);
    let mut queue = VecDeque::from([entity_id]);

    while let Some(current) = queue.pop_front() {
        let listed = collection
            .get(current)
            .map(|e| e.child_ids.as_slice())
            .unwrap_or(&[]);
        let mut seen_here = HashSet::new();
        let children = index
            .children(current)
            .iter()
            .chain(listed)
            .copied()
            .filter(|id| collection.contains(*id) && seen_here.insert(*id));

        for child in children {
            if visited.insert(child) {
                order.push(child);
                queue.push_back(child);
            } else if !revisited.contains(&child) {
                revisited.push(child);
            }
        }
    }
    (order, revisited)
}
