//! Integrity check and repair.
//!
//! Mutations through [`crate::commands`] keep the tree consistent, but imported
//! documents come from other tools and may not be. `check` lists every problem it can
//! find; `repair` fixes the ones that can be derived from `parent_id` alone:
//!
//! - `child_ids` lists are rebuilt from the parent pointers,
//! - hierarchy levels are recomputed from the parent chains,
//! - attribute `parent_id`s are pointed back at their owner.
//!
//! Duplicate ids, dangling parents and cycles need a human decision and are left in
//! the report as `remaining`.

use crate::model::{AttributeId, Collection, EntityId};
use crate::tree::{self, ChildIndex};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    DuplicateEntityId(EntityId),
    DuplicateAttributeId(AttributeId),
    DanglingParent {
        entity_id: EntityId,
        parent_id: EntityId,
    },
    ChildIdsMismatch {
        entity_id: EntityId,
        expected: Vec<EntityId>,
        found: Vec<EntityId>,
    },
    StaleLevel {
        entity_id: EntityId,
        expected: u32,
        found: u32,
    },
    AttributeParentMismatch {
        entity_id: EntityId,
        attribute_id: AttributeId,
        found: EntityId,
    },
    Cycle {
        entity_id: EntityId,
    },
}

impl IntegrityIssue {
    /// Whether [`repair`] can fix this issue.
    pub fn is_repairable(&self) -> bool {
        matches!(
            self,
            IntegrityIssue::ChildIdsMismatch { .. }
                | IntegrityIssue::StaleLevel { .. }
                | IntegrityIssue::AttributeParentMismatch { .. }
        )
    }
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::DuplicateEntityId(id) => {
                write!(f, "entity id {} is used more than once", id)
            }
            IntegrityIssue::DuplicateAttributeId(id) => {
                write!(f, "attribute id {} is used more than once", id)
            }
            IntegrityIssue::DanglingParent {
                entity_id,
                parent_id,
            } => write!(f, "entity {} points at missing parent {}", entity_id, parent_id),
            IntegrityIssue::ChildIdsMismatch {
                entity_id,
                expected,
                found,
            } => write!(
                f,
                "entity {} lists children {:?}, expected {:?}",
                entity_id, found, expected
            ),
            IntegrityIssue::StaleLevel {
                entity_id,
                expected,
                found,
            } => write!(
                f,
                "entity {} has level {}, expected {}",
                entity_id, found, expected
            ),
            IntegrityIssue::AttributeParentMismatch {
                entity_id,
                attribute_id,
                found,
            } => write!(
                f,
                "attribute {} of entity {} claims parent {}",
                attribute_id, entity_id, found
            ),
            IntegrityIssue::Cycle { entity_id } => {
                write!(f, "entity {} is part of a parent cycle", entity_id)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn check(collection: &Collection) -> IntegrityReport {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for entity in collection {
        if !seen.insert(entity.entity_id) && reported.insert(entity.entity_id) {
            issues.push(IntegrityIssue::DuplicateEntityId(entity.entity_id));
        }
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for attr in collection.iter().flat_map(|e| &e.attributes) {
        if !seen.insert(attr.attribute_id) && reported.insert(attr.attribute_id) {
            issues.push(IntegrityIssue::DuplicateAttributeId(attr.attribute_id));
        }
    }

    for orphan in tree::orphans(collection) {
        if let Some(parent_id) = orphan.parent_id {
            issues.push(IntegrityIssue::DanglingParent {
                entity_id: orphan.entity_id,
                parent_id,
            });
        }
    }

    let mut cyclic = HashSet::new();
    for entity in collection {
        if tree::ancestry(collection, entity.entity_id).cyclic {
            cyclic.insert(entity.entity_id);
            issues.push(IntegrityIssue::Cycle {
                entity_id: entity.entity_id,
            });
        }
    }

    let index = ChildIndex::build(collection);
    for entity in collection {
        let expected = index.children(entity.entity_id);
        if entity.child_ids != expected {
            issues.push(IntegrityIssue::ChildIdsMismatch {
                entity_id: entity.entity_id,
                expected: expected.to_vec(),
                found: entity.child_ids.clone(),
            });
        }
    }

    for entity in collection {
        if cyclic.contains(&entity.entity_id) {
            continue;
        }
        if let Some(expected) = tree::depth_of(collection, entity.entity_id) {
            if expected != entity.hierarchy_level {
                issues.push(IntegrityIssue::StaleLevel {
                    entity_id: entity.entity_id,
                    expected,
                    found: entity.hierarchy_level,
                });
            }
        }
    }

    for entity in collection {
        for attr in &entity.attributes {
            if attr.parent_id != entity.entity_id {
                issues.push(IntegrityIssue::AttributeParentMismatch {
                    entity_id: entity.entity_id,
                    attribute_id: attr.attribute_id,
                    found: attr.parent_id,
                });
            }
        }
    }

    debug!(issues = issues.len(), "integrity check finished");
    IntegrityReport { issues }
}

#[derive(Debug, Clone)]
pub struct Repair {
    pub collection: Collection,
    /// Number of records changed.
    pub fixed: usize,
    /// Issues left after the repair.
    pub remaining: Vec<IntegrityIssue>,
}

pub fn repair(collection: &Collection) -> Repair {
    let mut next = collection.clone();
    let mut fixed = tree::reconcile_all(&mut next);
    fixed += tree::relevel_all(&mut next);

    for entity in next.entities_mut().iter_mut() {
        let owner = entity.entity_id;
        for attr in entity.attributes.iter_mut().filter(|a| a.parent_id != owner) {
            attr.parent_id = owner;
            fixed += 1;
        }
    }

    let remaining = check(&next).issues;
    for issue in &remaining {
        warn!(%issue, "integrity issue needs manual attention");
    }
    debug!(fixed, remaining = remaining.len(), "repair finished");

    Repair {
        collection: next,
        fixed,
        remaining,
    }
}
