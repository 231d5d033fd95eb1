//! # Tree Structure
//!
//! Entities form a forest, stored flat. `parent_id` is the single source of truth for
//! the shape of the tree; everything here derives from it:
//!
//! - [`ChildIndex`]: parent id → child ids, in collection order. Rebuilt on demand
//!   (O(n)), never cached across mutations.
//! - [`descendants`]: subtree walk with a visited set, so a corrupt (cyclic) graph is
//!   reported instead of recursing forever.
//! - [`ancestry`]: the parent chain of an entity, also cycle-safe.
//! - [`reconcile_children`]: rewrites one parent's `child_ids` from the index, keeping
//!   the existing order and appending new children at the end.
//! - [`relevel_subtree`]: recomputes `hierarchy_level` below a moved entity.
//!
//! A `parent_id` that names no entity is *dangling*. Dangling parents are never
//! fabricated or rewritten here; they are levelled like roots and reported by
//! [`crate::commands::check`].

use crate::model::{Collection, Entity, EntityId};
use std::collections::{HashMap, HashSet, VecDeque};

/// Derived parent → children index.
#[derive(Debug, Default)]
pub struct ChildIndex {
    by_parent: HashMap<EntityId, Vec<EntityId>>,
}

impl ChildIndex {
    pub fn build(collection: &Collection) -> Self {
        Self::from_entities(collection.entities())
    }

    pub(crate) fn from_entities(entities: &[Entity]) -> Self {
        let mut by_parent: HashMap<EntityId, Vec<EntityId>> = HashMap::new();
        for entity in entities {
            if let Some(parent_id) = entity.parent_id {
                by_parent.entry(parent_id).or_default().push(entity.entity_id);
            }
        }
        Self { by_parent }
    }

    pub fn children(&self, parent_id: EntityId) -> &[EntityId] {
        self.by_parent
            .get(&parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// A parent/child edge where both ends exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship {
    pub parent_id: EntityId,
    pub child_id: EntityId,
}

pub fn relationships(collection: &Collection) -> Vec<Relationship> {
    collection
        .iter()
        .filter_map(|entity| {
            let parent_id = entity.parent_id?;
            collection.contains(parent_id).then_some(Relationship {
                parent_id,
                child_id: entity.entity_id,
            })
        })
        .collect()
}

pub fn roots(collection: &Collection) -> Vec<&Entity> {
    collection.iter().filter(|e| e.is_root()).collect()
}

/// Entities whose parent does not exist in the collection.
pub fn orphans(collection: &Collection) -> Vec<&Entity> {
    collection
        .iter()
        .filter(|e| matches!(e.parent_id, Some(pid) if !collection.contains(pid)))
        .collect()
}

pub fn children_of(collection: &Collection, entity_id: EntityId) -> Vec<&Entity> {
    collection
        .iter()
        .filter(|e| e.parent_id == Some(entity_id))
        .collect()
}

pub fn parent_of<'a>(collection: &'a Collection, entity: &Entity) -> Option<&'a Entity> {
    entity.parent_id.and_then(|pid| collection.get(pid))
}

/// Result of walking down from an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subtree {
    /// Every descendant (direct or transitive) exactly once, breadth first.
    pub ids: Vec<EntityId>,
    /// Ids reached a second time during the walk. Non-empty only for cyclic data.
    pub revisited: Vec<EntityId>,
}

impl Subtree {
    pub fn is_cyclic(&self) -> bool {
        !self.revisited.is_empty()
    }
}

pub fn descendants(collection: &Collection, entity_id: EntityId) -> Subtree {
    let index = ChildIndex::build(collection);
    walk(&index, entity_id)
}

fn walk(index: &ChildIndex, entity_id: EntityId) -> Subtree {
    let mut subtree = Subtree::default();
    let mut visited = HashSet::from([entity_id]);
    let mut queue = VecDeque::from([entity_id]);

    while let Some(current) = queue.pop_front() {
        for &child in index.children(current) {
            if visited.insert(child) {
                subtree.ids.push(child);
                queue.push_back(child);
            } else if !subtree.revisited.contains(&child) {
                subtree.revisited.push(child);
            }
        }
    }
    subtree
}

pub fn is_descendant_of(
    collection: &Collection,
    entity_id: EntityId,
    ancestor_id: EntityId,
) -> bool {
    ancestry(collection, entity_id).ids.contains(&ancestor_id)
}

/// The chain of parents above an entity, nearest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ancestry {
    pub ids: Vec<EntityId>,
    /// Set when the chain ends at a `parent_id` that names no entity.
    pub dangling: Option<EntityId>,
    /// Set when the chain loops back on itself.
    pub cyclic: bool,
}

pub fn ancestry(collection: &Collection, entity_id: EntityId) -> Ancestry {
    let mut result = Ancestry::default();
    let mut seen = HashSet::from([entity_id]);
    let mut current = collection.get(entity_id).and_then(|e| e.parent_id);

    while let Some(parent_id) = current {
        let Some(parent) = collection.get(parent_id) else {
            result.dangling = Some(parent_id);
            break;
        };
        if !seen.insert(parent_id) {
            result.cyclic = true;
            break;
        }
        result.ids.push(parent_id);
        current = parent.parent_id;
    }
    result
}

/// Root-first path ending at `entity_id`. Empty when the entity does not exist.
pub fn path_to(collection: &Collection, entity_id: EntityId) -> Vec<&Entity> {
    let Some(entity) = collection.get(entity_id) else {
        return Vec::new();
    };
    let mut path: Vec<&Entity> = ancestry(collection, entity_id)
        .ids
        .iter()
        .rev()
        .filter_map(|id| collection.get(*id))
        .collect();
    path.push(entity);
    path
}

/// Depth derived from the parent chain (root = 1). `None` for unknown ids and for
/// entities caught in a cycle.
pub fn depth_of(collection: &Collection, entity_id: EntityId) -> Option<u32> {
    collection.get(entity_id)?;
    let chain = ancestry(collection, entity_id);
    if chain.cyclic {
        return None;
    }
    Some(chain.ids.len() as u32 + 1)
}

/// The level a new child of `parent_id` should get: parent's level + 1, or 1 for roots
/// and dangling parents.
pub fn level_under(collection: &Collection, parent_id: Option<EntityId>) -> u32 {
    parent_id
        .and_then(|pid| collection.get(pid))
        .map(|parent| parent.hierarchy_level.saturating_add(1))
        .unwrap_or(1)
}

/// Rewrites `parent_id`'s child list so it matches the entities that point at it.
///
/// Children already listed keep their position; newly found children are appended in
/// collection order; stale and duplicate entries are dropped.
pub(crate) fn reconcile_children(collection: &mut Collection, parent_id: EntityId) {
    let actual: Vec<EntityId> = collection
        .iter()
        .filter(|e| e.parent_id == Some(parent_id))
        .map(|e| e.entity_id)
        .collect();

    let Some(parent) = collection.get_mut(parent_id) else {
        return;
    };
    parent.child_ids = merge_child_order(&parent.child_ids, &actual);
}

/// Reconciles every entity's child list. Returns how many lists changed.
pub(crate) fn reconcile_all(collection: &mut Collection) -> usize {
    let index = ChildIndex::build(collection);
    let mut changed = 0;
    for entity in collection.entities_mut().iter_mut() {
        let merged = merge_child_order(&entity.child_ids, index.children(entity.entity_id));
        if merged != entity.child_ids {
            entity.child_ids = merged;
            changed += 1;
        }
    }
    changed
}

fn merge_child_order(listed: &[EntityId], actual: &[EntityId]) -> Vec<EntityId> {
    let actual_set: HashSet<EntityId> = actual.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut merged: Vec<EntityId> = listed
        .iter()
        .copied()
        .filter(|id| actual_set.contains(id) && seen.insert(*id))
        .collect();
    merged.extend(actual.iter().copied().filter(|id| seen.insert(*id)));
    merged
}

/// Recomputes `hierarchy_level` for `entity_id` (from its parent) and every descendant
/// below it. Returns the number of entities whose level changed.
pub(crate) fn relevel_subtree(collection: &mut Collection, entity_id: EntityId) -> usize {
    let Some(entity) = collection.get(entity_id) else {
        return 0;
    };
    let top_level = level_under(collection, entity.parent_id);
    let index = ChildIndex::build(collection);

    let mut levels: HashMap<EntityId, u32> = HashMap::from([(entity_id, top_level)]);
    let mut queue = VecDeque::from([entity_id]);
    while let Some(current) = queue.pop_front() {
        let child_level = levels[&current].saturating_add(1);
        for &child in index.children(current) {
            if !levels.contains_key(&child) {
                levels.insert(child, child_level);
                queue.push_back(child);
            }
        }
    }
    apply_levels(collection, &levels)
}

/// Recomputes every level from the parent chains. Entities caught in a cycle keep
/// their current level. Returns the number of entities whose level changed.
pub(crate) fn relevel_all(collection: &mut Collection) -> usize {
    let levels: HashMap<EntityId, u32> = {
        let snapshot: &Collection = collection;
        snapshot
            .iter()
            .filter_map(|e| depth_of(snapshot, e.entity_id).map(|depth| (e.entity_id, depth)))
            .collect()
    };
    apply_levels(collection, &levels)
}

fn apply_levels(collection: &mut Collection, levels: &HashMap<EntityId, u32>) -> usize {
    let mut changed = 0;
    for entity in collection.entities_mut().iter_mut() {
        if let Some(&level) = levels.get(&entity.entity_id) {
            if entity.hierarchy_level != level {
                entity.hierarchy_level = level;
                changed += 1;
            }
        }
    }
    changed
}
