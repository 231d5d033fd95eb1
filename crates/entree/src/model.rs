//! # Domain Model: Entities, Attributes and the Collection
//!
//! An entity hierarchy is a **forest** of [`Entity`] records. Each entity describes a
//! schema-like record (a table, a feature class, ...) and owns an ordered list of
//! [`Attribute`] records (its fields). Every record is tagged with the subsystem that
//! owns it (`system`).
//!
//! ## Two Kinds of Identifier
//!
//! Like most interchange formats, the JSON documents we load identify records with
//! plain integers (`Entity ID`, `Attribute ID`). Those are user-visible, stable for the
//! session, and unique across the whole collection.
//!
//! On top of that every record carries an [`Identity`]: an opaque UUID assigned when the
//! record is created or parsed. Identities exist so a UI can key its widgets on
//! something that never collides, even while the user edits the integer ids. They are
//! a session artifact and are **never** exported.
//!
//! ## Tree Shape
//!
//! The tree is expressed flat: `parent_id` points up, `child_ids` lists the children.
//! `parent_id` is the source of truth. `child_ids` is kept in sync by every mutating
//! operation (see [`crate::tree`]) so that exported documents stay consistent for
//! consumers that only read one side.
//!
//! | Field | Rule |
//! |-------|------|
//! | `entity_id` | unique in the collection |
//! | `parent_id` | `None` for roots; otherwise the id of exactly one entity, or dangling |
//! | `child_ids` | exactly the entities whose `parent_id` is this entity |
//! | `hierarchy_level` | 1 for roots, parent's level + 1 otherwise |
//! | `Attribute::parent_id` | the owning entity's `entity_id` |
//!
//! ## Snapshots
//!
//! [`Collection`] is a plain value. Operations in [`crate::commands`] take a
//! `&Collection` and hand back a new one; nothing is mutated in place. The state
//! container ([`crate::store`]) shares committed snapshots as `Arc<Collection>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type EntityId = i64;
pub type AttributeId = i64;

/// Process-local opaque identifier, regenerated on every parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(Uuid);

impl Identity {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Primary key flag. Serialized as `"Yes"` / `"No"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrimaryKey {
    Yes,
    #[default]
    No,
}

impl PrimaryKey {
    pub fn is_yes(self) -> bool {
        matches!(self, PrimaryKey::Yes)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrimaryKey::Yes => "Yes",
            PrimaryKey::No => "No",
        }
    }
}

impl From<bool> for PrimaryKey {
    fn from(value: bool) -> Self {
        if value {
            PrimaryKey::Yes
        } else {
            PrimaryKey::No
        }
    }
}

impl FromStr for PrimaryKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" => Ok(PrimaryKey::Yes),
            "no" | "n" | "false" => Ok(PrimaryKey::No),
            other => Err(format!("Invalid primary key flag '{}': expected Yes or No", other)),
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub identity: Identity,
    pub attribute_id: AttributeId,
    pub name: String,
    pub description: Option<String>,
    pub primary_key: PrimaryKey,
    pub parent_id: EntityId,
    pub system: String,
}

impl Attribute {
    /// A fresh attribute owned by `owner`, inheriting the owner's system.
    pub fn new(attribute_id: AttributeId, name: impl Into<String>, owner: &Entity) -> Self {
        Self {
            identity: Identity::new(),
            attribute_id,
            name: name.into(),
            description: None,
            primary_key: PrimaryKey::No,
            parent_id: owner.entity_id,
            system: owner.system.clone(),
        }
    }

    /// Field-by-field equality that ignores [`Identity`].
    pub fn same_content(&self, other: &Attribute) -> bool {
        self.attribute_id == other.attribute_id
            && self.name == other.name
            && self.description == other.description
            && self.primary_key == other.primary_key
            && self.parent_id == other.parent_id
            && self.system == other.system
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub identity: Identity,
    pub entity_id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub system: String,
    pub entity_type: Option<String>,
    pub hierarchy_level: u32,
    pub parent_id: Option<EntityId>,
    pub child_ids: Vec<EntityId>,
    pub attributes: Vec<Attribute>,
}

impl Entity {
    pub fn new(
        entity_id: EntityId,
        name: impl Into<String>,
        parent_id: Option<EntityId>,
        hierarchy_level: u32,
    ) -> Self {
        Self {
            identity: Identity::new(),
            entity_id,
            name: name.into(),
            description: None,
            system: String::new(),
            entity_type: None,
            hierarchy_level,
            parent_id,
            child_ids: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// True when the system tag denotes dual ownership: it lists several systems
    /// (`"EAM, iPen"`) or is literally "both" in any case.
    pub fn is_dual_system(&self) -> bool {
        is_dual_system(&self.system)
    }

    pub fn attribute(&self, attribute_id: AttributeId) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attr| attr.attribute_id == attribute_id)
    }

    /// Field-by-field equality that ignores [`Identity`] on the entity and its attributes.
    pub fn same_content(&self, other: &Entity) -> bool {
        self.entity_id == other.entity_id
            && self.name == other.name
            && self.description == other.description
            && self.system == other.system
            && self.entity_type == other.entity_type
            && self.hierarchy_level == other.hierarchy_level
            && self.parent_id == other.parent_id
            && self.child_ids == other.child_ids
            && self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .zip(&other.attributes)
                .all(|(a, b)| a.same_content(b))
    }
}

pub fn is_dual_system(system: &str) -> bool {
    system.contains(',') || system.eq_ignore_ascii_case("both")
}

/// The system vocabulary used by filters and entity forms.
///
/// `All` and `Both` are meta values: `All` disables system filtering, `Both` selects
/// entities owned by more than one system. Anything outside the known set is kept
/// verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntitySystem {
    All,
    Both,
    Eam,
    IPen,
    GisWn,
    Other(String),
}

impl EntitySystem {
    /// Systems an entity form may assign (the meta value `All` is filter-only).
    pub const ASSIGNABLE: [EntitySystem; 4] = [
        EntitySystem::Eam,
        EntitySystem::IPen,
        EntitySystem::GisWn,
        EntitySystem::Both,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            EntitySystem::All => "All",
            EntitySystem::Both => "Both",
            EntitySystem::Eam => "EAM",
            EntitySystem::IPen => "iPen",
            EntitySystem::GisWn => "GIS-WN",
            EntitySystem::Other(s) => s,
        }
    }
}

impl FromStr for EntitySystem {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let known = [
            EntitySystem::All,
            EntitySystem::Both,
            EntitySystem::Eam,
            EntitySystem::IPen,
            EntitySystem::GisWn,
        ];
        Ok(known
            .into_iter()
            .find(|system| system.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or_else(|| EntitySystem::Other(s.to_string())))
    }
}

impl fmt::Display for EntitySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The view filter held by the state container. Both parts are optional and combine
/// with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityFilter {
    pub system: Option<EntitySystem>,
    pub search_term: Option<String>,
}

impl EntityFilter {
    pub fn with_system(mut self, system: EntitySystem) -> Self {
        self.system = Some(system);
        self
    }

    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.system.is_none() && self.search_term.is_none()
    }
}

/// An ordered sequence of entities. Export preserves this order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    entities: Vec<Entity>,
}

impl Collection {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn into_vec(self) -> Vec<Entity> {
        self.entities
    }

    pub fn get(&self, entity_id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.entity_id == entity_id)
    }

    pub fn contains(&self, entity_id: EntityId) -> bool {
        self.get(entity_id).is_some()
    }

    pub fn position(&self, entity_id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.entity_id == entity_id)
    }

    pub fn attribute_count(&self) -> usize {
        self.entities.iter().map(|e| e.attributes.len()).sum()
    }

    /// Structural equality ignoring every [`Identity`].
    pub fn same_content(&self, other: &Collection) -> bool {
        self.len() == other.len()
            && self
                .entities
                .iter()
                .zip(&other.entities)
                .all(|(a, b)| a.same_content(b))
    }

    pub(crate) fn push(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub(crate) fn entities_mut(&mut self) -> &mut Vec<Entity> {
        &mut self.entities
    }

    pub(crate) fn get_mut(&mut self, entity_id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.entity_id == entity_id)
    }
}

impl FromIterator<Entity> for Collection {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

impl IntoIterator for Collection {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}
