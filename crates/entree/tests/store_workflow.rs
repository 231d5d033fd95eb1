use entree::commands::{delete, AttributePatch, EntityPatch};
use entree::model::{EntityFilter, EntitySystem, PrimaryKey};
use entree::store::{Command, EntityStore, Outcome};
use entree::validation::{AttributeDraft, EntityDraft};
use entree::EntreeError;
use std::fs;
use tempfile::tempdir;

const SAMPLE: &str = include_str!("fixtures/sample.json");

fn setup() -> EntityStore {
    let mut store = EntityStore::new();
    store.import_text(SAMPLE).unwrap();
    store
}

fn json_exts() -> Vec<String> {
    vec![".json".to_string()]
}

#[test]
fn test_build_a_hierarchy_from_drafts() {
    let mut store = EntityStore::new();
    let network = store
        .create_entity(&EntityDraft::new("Network").with_system("Both"))
        .unwrap();
    let pipe = store
        .create_entity(&EntityDraft::new("Pipe").with_parent(network.entity_id))
        .unwrap();
    let key = store
        .create_attribute(
            pipe.entity_id,
            &AttributeDraft::new("PipeId").with_primary_key(PrimaryKey::Yes),
        )
        .unwrap();

    assert_eq!(pipe.system, "EAM");
    assert_eq!(pipe.hierarchy_level, 2);
    assert_eq!(key.system, "EAM");
    assert_eq!(
        store.entities().get(network.entity_id).unwrap().child_ids,
        vec![pipe.entity_id]
    );
}

#[test]
fn test_search_and_filter() {
    let mut store = setup();

    let names: Vec<_> = store.search("eam").iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, vec!["Water Network", "Valve"]);
    assert!(store.search("").is_empty());

    store.set_filter(EntityFilter::default().with_system(EntitySystem::Both));
    let ids: Vec<_> = store.filtered().iter().map(|e| e.entity_id).collect();
    assert_eq!(ids, vec![1]);

    store.set_filter(
        EntityFilter::default()
            .with_system(EntitySystem::IPen)
            .with_search_term("metres"),
    );
    let ids: Vec<_> = store.filtered().iter().map(|e| e.entity_id).collect();
    assert_eq!(ids, vec![4]);
}

#[test]
fn test_preview_then_delete_subtree() {
    let mut store = setup();

    let preview = delete::preview(store.entities(), 2).unwrap();
    assert_eq!(preview.target.name, "Pipe");
    assert_eq!(preview.descendant_count, 1);
    assert_eq!(preview.attribute_count, 3);

    let deletion = store.delete_entity(2);
    assert_eq!(deletion.removed, vec![2, 4]);
    assert_eq!(store.entities().len(), 3);
    assert_eq!(store.entities().get(1).unwrap().child_ids, vec![3]);
    assert!(store.check().is_clean());
}

#[test]
fn test_move_subtree_between_roots() {
    let mut store = setup();
    store
        .update_entity(2, &EntityPatch::new().with_parent(Some(5)))
        .unwrap();

    let entities = store.entities();
    assert_eq!(entities.get(1).unwrap().child_ids, vec![3]);
    assert_eq!(entities.get(5).unwrap().child_ids, vec![2]);
    assert_eq!(entities.get(4).unwrap().hierarchy_level, 3);
    assert!(store.check().is_clean());

    let err = store
        .update_entity(2, &EntityPatch::new().with_parent(Some(4)))
        .unwrap_err();
    assert!(matches!(err, EntreeError::Integrity(_)));
}

#[test]
fn test_dispatch_sequence() {
    let mut store = setup();
    let commands = vec![
        Command::CopyEntity { entity_id: 2 },
        Command::AddAttribute { entity_id: 3 },
        Command::UpdateAttribute {
            entity_id: 3,
            attribute_id: 7,
            patch: AttributePatch::new().with_name("ValveId"),
        },
        Command::DeleteAttribute {
            entity_id: 3,
            attribute_id: 99,
        },
    ];
    let outcomes: Vec<_> = commands
        .into_iter()
        .map(|c| store.dispatch(c).unwrap())
        .collect();

    match &outcomes[0] {
        Outcome::EntityAdded(copy) => {
            assert_eq!(copy.entity_id, 6);
            assert_eq!(copy.name, "Pipe (Copy)");
            let ids: Vec<_> = copy.attributes.iter().map(|a| a.attribute_id).collect();
            assert_eq!(ids, vec![5, 6]);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(matches!(&outcomes[1], Outcome::AttributeAdded(a) if a.attribute_id == 7));
    assert_eq!(outcomes[2], Outcome::Updated);
    assert_eq!(outcomes[3], Outcome::NotFound);
    assert_eq!(
        store.entities().get(3).unwrap().attributes[0].name,
        "ValveId"
    );
}

#[test]
fn test_import_file_gate_and_failure() {
    let dir = tempdir().unwrap();
    let mut store = setup();
    let before = store.snapshot();

    let csv = dir.path().join("model.csv");
    fs::write(&csv, "a,b").unwrap();
    let err = store.import_file(&csv, &json_exts()).unwrap_err();
    assert!(matches!(err, EntreeError::InvalidFileType));
    assert_eq!(store.error(), Some("Please upload a JSON file"));

    let bad = dir.path().join("bad.json");
    fs::write(&bad, r#"[{"Entity Name":"x"}]"#).unwrap();
    let err = store.import_file(&bad, &json_exts()).unwrap_err();
    assert_eq!(err.to_string(), "Missing required entity fields");

    assert!(!store.loading());
    assert!(std::sync::Arc::ptr_eq(&before, &store.snapshot()));
}

#[test]
fn test_export_and_reimport() {
    let dir = tempdir().unwrap();
    let store = setup();
    let path = store.export_to(dir.path(), "entity_hierarchy.json").unwrap();

    let mut other = EntityStore::new();
    let count = other.import_file(&path, &json_exts()).unwrap();
    assert_eq!(count, 5);
    assert!(other.entities().same_content(store.entities()));
}
