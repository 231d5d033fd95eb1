use entree::codec::{parse, serialize};
use entree::commands::{self, check, AttributePatch, EntityPatch};
use entree::model::{AttributeId, Collection, EntityId};
use entree::tree::descendants;
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    AddRoot,
    AddChild(usize),
    Copy(usize),
    Delete(usize),
    AddAttribute(usize),
    CopyAttribute(usize),
    EditEntity(usize, Edit),
    EditAttribute(usize, Edit),
    Move(usize, usize),
}

/// Field values for an entity or attribute edit. Names may be blank, which the
/// update commands refuse.
#[derive(Debug, Clone)]
struct Edit {
    name: String,
    description: Option<String>,
    system: String,
}

fn edit() -> impl Strategy<Value = Edit> {
    (
        "[A-Za-z0-9 ]{0,8}",
        proptest::option::of("[A-Za-z0-9 ,._-]{0,16}"),
        "(EAM|iPen|GIS-WN|Both|[A-Za-z ,]{0,8})",
    )
        .prop_map(|(name, description, system)| Edit { name, description, system })
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => Just(Op::AddRoot),
        3 => any::<usize>().prop_map(Op::AddChild),
        1 => any::<usize>().prop_map(Op::Copy),
        1 => any::<usize>().prop_map(Op::Delete),
        2 => any::<usize>().prop_map(Op::AddAttribute),
        1 => any::<usize>().prop_map(Op::CopyAttribute),
        2 => (any::<usize>(), edit()).prop_map(|(n, e)| Op::EditEntity(n, e)),
        2 => (any::<usize>(), edit()).prop_map(|(n, e)| Op::EditAttribute(n, e)),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(n, m)| Op::Move(n, m)),
    ]
}

/// First attribute of the entity at position `n`, if any.
fn pick_attribute(collection: &Collection, n: usize) -> Option<(EntityId, AttributeId)> {
    let id = pick(collection, n)?;
    let attr = collection.get(id)?.attributes.first()?;
    Some((id, attr.attribute_id))
}

/// Picks an existing entity id by position, if any.
fn pick(collection: &Collection, n: usize) -> Option<EntityId> {
    if collection.is_empty() {
        None
    } else {
        Some(collection.entities()[n % collection.len()].entity_id)
    }
}

fn apply(collection: &Collection, op: &Op) -> Collection {
    match op {
        Op::AddRoot => commands::add_entity(collection, None).1,
        Op::AddChild(n) => commands::add_entity(collection, pick(collection, *n)).1,
        Op::Copy(n) => pick(collection, *n)
            .and_then(|id| commands::copy_entity(collection, id))
            .map_or_else(|| collection.clone(), |(_, next)| next),
        Op::Delete(n) => match pick(collection, *n) {
            Some(id) => commands::delete_entity(collection, id).collection,
            None => collection.clone(),
        },
        Op::AddAttribute(n) => pick(collection, *n)
            .and_then(|id| commands::add_attribute(collection, id))
            .map_or_else(|| collection.clone(), |(_, next)| next),
        Op::CopyAttribute(n) => pick_attribute(collection, *n)
            .and_then(|(id, attr)| commands::copy_attribute(collection, id, attr))
            .map_or_else(|| collection.clone(), |(_, next)| next),
        Op::EditEntity(n, edit) => match pick(collection, *n) {
            Some(id) => {
                let patch = EntityPatch::new()
                    .with_name(edit.name.clone())
                    .with_description(edit.description.clone())
                    .with_system(edit.system.clone());
                commands::update_entity(collection, id, &patch)
                    .unwrap_or_else(|_| collection.clone())
            }
            None => collection.clone(),
        },
        Op::EditAttribute(n, edit) => match pick_attribute(collection, *n) {
            Some((id, attr)) => {
                let patch = AttributePatch::new()
                    .with_name(edit.name.clone())
                    .with_description(edit.description.clone())
                    .with_system(edit.system.clone());
                commands::update_attribute(collection, id, attr, &patch)
                    .unwrap_or_else(|_| collection.clone())
            }
            None => collection.clone(),
        },
        Op::Move(n, m) => match (pick(collection, *n), pick(collection, *m)) {
            (Some(id), target) => {
                let patch = EntityPatch::new().with_parent(target.filter(|t| *t != id));
                commands::update_entity(collection, id, &patch)
                    .unwrap_or_else(|_| collection.clone())
            }
            _ => collection.clone(),
        },
    }
}

fn build(ops: &[Op]) -> Collection {
    ops.iter()
        .fold(Collection::default(), |collection, op| apply(&collection, op))
}

proptest! {
    #[test]
    fn operations_keep_the_tree_consistent(ops in prop::collection::vec(op(), 0..40)) {
        let collection = build(&ops);

        let entity_ids: Vec<_> = collection.iter().map(|e| e.entity_id).collect();
        let unique: HashSet<_> = entity_ids.iter().collect();
        prop_assert_eq!(unique.len(), entity_ids.len());

        let attribute_ids: Vec<_> = collection
            .iter()
            .flat_map(|e| e.attributes.iter().map(|a| a.attribute_id))
            .collect();
        let unique: HashSet<_> = attribute_ids.iter().collect();
        prop_assert_eq!(unique.len(), attribute_ids.len());

        let report = check(&collection);
        prop_assert!(report.is_clean(), "issues: {:?}", report.issues);
    }

    #[test]
    fn delete_removes_target_and_descendants(
        ops in prop::collection::vec(op(), 1..40),
        pick_n in any::<usize>(),
    ) {
        let collection = build(&ops);
        prop_assume!(!collection.is_empty());
        let target = pick(&collection, pick_n).unwrap();
        let n = descendants(&collection, target).ids.len();

        let deletion = commands::delete_entity(&collection, target);
        prop_assert_eq!(deletion.removed.len(), n + 1);
        prop_assert_eq!(deletion.collection.len(), collection.len() - n - 1);
        prop_assert!(!deletion.collection.contains(target));
        prop_assert!(check(&deletion.collection).is_clean());
    }

    #[test]
    fn copy_gets_fresh_ids_and_no_children(
        ops in prop::collection::vec(op(), 1..30),
        pick_n in any::<usize>(),
    ) {
        let collection = build(&ops);
        prop_assume!(!collection.is_empty());
        let source = pick(&collection, pick_n).unwrap();

        let (copy, next) = commands::copy_entity(&collection, source).unwrap();
        prop_assert!(!collection.contains(copy.entity_id));
        prop_assert!(copy.child_ids.is_empty());
        prop_assert_eq!(next.len(), collection.len() + 1);
        for attr in &copy.attributes {
            prop_assert_eq!(attr.parent_id, copy.entity_id);
            let clash = collection
                .iter()
                .flat_map(|e| &e.attributes)
                .any(|a| a.attribute_id == attr.attribute_id);
            prop_assert!(!clash);
        }
    }

    #[test]
    fn edits_never_store_a_blank_name(ops in prop::collection::vec(op(), 0..40)) {
        let collection = build(&ops);
        for entity in collection.iter() {
            prop_assert!(!entity.name.trim().is_empty());
            for attr in &entity.attributes {
                prop_assert!(!attr.name.trim().is_empty());
            }
        }
    }

    #[test]
    fn serialize_then_parse_preserves_content(ops in prop::collection::vec(op(), 0..30)) {
        let collection = build(&ops);
        let reparsed = parse(&serialize(&collection).unwrap()).unwrap();
        prop_assert!(collection.same_content(&reparsed));
    }
}
