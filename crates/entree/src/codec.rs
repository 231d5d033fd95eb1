//! # JSON Document Codec
//!
//! Entity hierarchies travel as a JSON array of entity records using the spreadsheet
//! style key names of the tools that produce them (`"Entity ID"`, `"Part Of Parent ID"`,
//! ...). This module converts between that document and a [`Collection`].
//!
//! ## Ingest
//!
//! Exporters in the wild are sloppy, so ingest is tolerant about *shape* and strict
//! about *identity*:
//!
//! 1. A textual pre-pass rewrites bare `NaN` values (`"Entity Hierarchy Level": NaN`)
//!    to `null` so the document becomes valid JSON.
//! 2. The document must be a JSON array, otherwise the import fails.
//! 3. Every entity needs a non-zero id and a non-empty name, every attribute likewise.
//!    Ids above [`MAX_ID`](crate::ids::MAX_ID) are refused so allocation never runs
//!    out of room. A single bad record fails the whole import.
//! 4. Everything else is normalized in one place (`normalize_entity`): null-like
//!    descriptions, odd primary key spellings, non-integer child ids, attribute parent
//!    ids that disagree with their owner, and missing hierarchy levels.
//!
//! Raw records are read into helper structs whose fields are plain
//! [`serde_json::Value`]s, so a wrong type in one field never aborts the parse before
//! normalization has had a chance to fix it.
//!
//! ## Export
//!
//! [`serialize`] writes every field back under the same key names, pretty-printed with
//! two-space indentation. Identities are not exported. `parse(serialize(c))` yields a
//! collection with the same content as `c`.

use crate::error::{ParseError, Result};
use crate::ids::MAX_ID;
use crate::model::{Attribute, Collection, Entity, EntityId, Identity, PrimaryKey};
use crate::tree;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

// Textual pass: a string value containing `: NaN` is rewritten to `: null` as well,
// so such text does not survive import unchanged.
static NAN_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":\s*NaN").expect("NaN pattern is a valid regex"));

#[derive(Debug, Default, Deserialize)]
struct RawEntity {
    #[serde(rename = "Entity ID", default)]
    id: Value,
    #[serde(rename = "Entity Name", default)]
    name: Value,
    #[serde(rename = "Entity Description", default)]
    description: Value,
    #[serde(rename = "Entity System", default)]
    system: Value,
    #[serde(rename = "Entity Type", default)]
    entity_type: Value,
    #[serde(rename = "Entity Hierarchy Level", default)]
    hierarchy_level: Value,
    #[serde(rename = "Entity parent ID", default)]
    parent_id: Value,
    #[serde(rename = "Entity child ID", default)]
    child_ids: Value,
    #[serde(rename = "Attributes", default)]
    attributes: Value,
}

#[derive(Debug, Default, Deserialize)]
struct RawAttribute {
    #[serde(rename = "Attribute ID", default)]
    id: Value,
    #[serde(rename = "Attribute Name", default)]
    name: Value,
    #[serde(rename = "Attribute Description", default)]
    description: Value,
    #[serde(rename = "PrimaryKey", default)]
    primary_key: Value,
    #[serde(rename = "Part Of Parent ID", default)]
    parent_id: Value,
    #[serde(rename = "Attribute System", default)]
    system: Value,
}

/// Parses an exported document.
pub fn parse(text: &str) -> std::result::Result<Collection, ParseError> {
    let text = NAN_VALUE.replace_all(text, ": null");
    let document: Value = serde_json::from_str(&text).map_err(|_| ParseError::InvalidJson)?;
    let Value::Array(records) = document else {
        return Err(ParseError::ExpectedArray);
    };

    let entities = records
        .into_iter()
        .map(|record| {
            let raw: RawEntity =
                serde_json::from_value(record).map_err(|_| ParseError::MissingEntityFields)?;
            normalize_entity(raw)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut collection = Collection::new(entities);
    derive_missing_levels(&mut collection);

    info!(
        entities = collection.len(),
        attributes = collection.attribute_count(),
        "document parsed"
    );
    Ok(collection)
}

/// Parses raw file contents. Invalid UTF-8 is reported as invalid JSON.
pub fn parse_bytes(bytes: &[u8]) -> std::result::Result<Collection, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidJson)?;
    parse(text)
}

/// Turns one raw record into an entity. Levels that could not be read are left at 0
/// and filled in by [`derive_missing_levels`].
fn normalize_entity(raw: RawEntity) -> std::result::Result<Entity, ParseError> {
    let entity_id = truthy_id(&raw.id).ok_or(ParseError::MissingEntityFields)?;
    let entity_id = within_range(entity_id)?;
    let name = required_name(&raw.name).ok_or(ParseError::MissingEntityFields)?;

    let parent_id = as_integer(&raw.parent_id).filter(|id| *id != 0);
    let hierarchy_level = as_integer(&raw.hierarchy_level)
        .filter(|level| *level > 0)
        .and_then(|level| u32::try_from(level).ok())
        .unwrap_or(0);

    let child_ids = match &raw.child_ids {
        Value::Array(items) => {
            let ids: Vec<EntityId> = items.iter().filter_map(strict_integer).collect();
            let dropped = items.len() - ids.len();
            if dropped > 0 {
                debug!(entity_id, dropped, "non-integer child ids dropped");
            }
            ids
        }
        _ => Vec::new(),
    };

    let mut entity = Entity {
        identity: Identity::new(),
        entity_id,
        name,
        description: loose_text(&raw.description),
        system: loose_text(&raw.system).unwrap_or_default(),
        entity_type: raw.entity_type.as_str().map(str::to_string),
        hierarchy_level,
        parent_id,
        child_ids,
        attributes: Vec::new(),
    };

    let raw_attributes = match raw.attributes {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        _ => {
            warn!(entity_id, "Attributes is not a list, ignoring it");
            Vec::new()
        }
    };
    entity.attributes = raw_attributes
        .into_iter()
        .map(|value| {
            let raw: RawAttribute =
                serde_json::from_value(value).map_err(|_| ParseError::MissingAttributeFields)?;
            normalize_attribute(raw, entity_id)
        })
        .collect::<std::result::Result<_, _>>()?;

    Ok(entity)
}

fn normalize_attribute(
    raw: RawAttribute,
    owner_id: EntityId,
) -> std::result::Result<Attribute, ParseError> {
    let attribute_id = truthy_id(&raw.id).ok_or(ParseError::MissingAttributeFields)?;
    let attribute_id = within_range(attribute_id)?;
    let name = required_name(&raw.name).ok_or(ParseError::MissingAttributeFields)?;

    match as_integer(&raw.parent_id) {
        Some(claimed) if claimed != owner_id => {
            warn!(attribute_id, claimed, owner_id, "attribute parent rewritten to its owner");
        }
        _ => {}
    }

    let primary_key = match &raw.primary_key {
        Value::Bool(flag) => PrimaryKey::from(*flag),
        Value::String(s) => s.parse::<PrimaryKey>().unwrap_or_default(),
        _ => PrimaryKey::No,
    };

    Ok(Attribute {
        identity: Identity::new(),
        attribute_id,
        name,
        description: loose_text(&raw.description),
        primary_key,
        parent_id: owner_id,
        system: loose_text(&raw.system).unwrap_or_default(),
    })
}

fn derive_missing_levels(collection: &mut Collection) {
    let derived: Vec<(EntityId, u32)> = {
        let snapshot: &Collection = collection;
        snapshot
            .iter()
            .filter(|e| e.hierarchy_level == 0)
            .map(|e| {
                let level = tree::depth_of(snapshot, e.entity_id).unwrap_or(1);
                (e.entity_id, level)
            })
            .collect()
    };

    for (entity_id, level) in derived {
        debug!(entity_id, level, "hierarchy level derived from parent chain");
        if let Some(entity) = collection.get_mut(entity_id) {
            entity.hierarchy_level = level;
        }
    }
}

/// Integers, integral floats and numeric strings.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        other => strict_integer(other),
    }
}

fn strict_integer(value: &Value) -> Option<i64> {
    let number = value.as_number()?;
    if let Some(n) = number.as_i64() {
        return Some(n);
    }
    let f = number.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
}

fn within_range(id: i64) -> std::result::Result<i64, ParseError> {
    if id > MAX_ID {
        return Err(ParseError::IdOutOfRange(id));
    }
    Ok(id)
}

fn truthy_id(value: &Value) -> Option<i64> {
    as_integer(value).filter(|id| *id != 0)
}

fn required_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// Text for optional free-text fields: null, objects and arrays carry no text.
fn loose_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Object(_) | Value::Array(_) => None,
    }
}

#[derive(Serialize)]
struct EntityRecord<'a> {
    #[serde(rename = "Entity ID")]
    id: EntityId,
    #[serde(rename = "Entity Name")]
    name: &'a str,
    #[serde(rename = "Entity Description")]
    description: Option<&'a str>,
    #[serde(rename = "Entity System")]
    system: &'a str,
    #[serde(rename = "Entity Type")]
    entity_type: Option<&'a str>,
    #[serde(rename = "Entity Hierarchy Level")]
    hierarchy_level: u32,
    #[serde(rename = "Entity parent ID")]
    parent_id: Option<EntityId>,
    #[serde(rename = "Entity child ID")]
    child_ids: &'a [EntityId],
    #[serde(rename = "Attributes")]
    attributes: Vec<AttributeRecord<'a>>,
}

#[derive(Serialize)]
struct AttributeRecord<'a> {
    #[serde(rename = "Attribute ID")]
    id: i64,
    #[serde(rename = "Attribute Name")]
    name: &'a str,
    #[serde(rename = "Attribute Description")]
    description: Option<&'a str>,
    #[serde(rename = "PrimaryKey")]
    primary_key: PrimaryKey,
    #[serde(rename = "Part Of Parent ID")]
    parent_id: EntityId,
    #[serde(rename = "Attribute System")]
    system: &'a str,
}

impl<'a> From<&'a Entity> for EntityRecord<'a> {
    fn from(entity: &'a Entity) -> Self {
        Self {
            id: entity.entity_id,
            name: &entity.name,
            description: entity.description.as_deref(),
            system: &entity.system,
            entity_type: entity.entity_type.as_deref(),
            hierarchy_level: entity.hierarchy_level,
            parent_id: entity.parent_id,
            child_ids: &entity.child_ids,
            attributes: entity.attributes.iter().map(AttributeRecord::from).collect(),
        }
    }
}

impl<'a> From<&'a Attribute> for AttributeRecord<'a> {
    fn from(attr: &'a Attribute) -> Self {
        Self {
            id: attr.attribute_id,
            name: &attr.name,
            description: attr.description.as_deref(),
            primary_key: attr.primary_key,
            parent_id: attr.parent_id,
            system: &attr.system,
        }
    }
}

/// Serializes the collection as a pretty-printed document, in collection order.
pub fn serialize(collection: &Collection) -> Result<String> {
    let records: Vec<EntityRecord<'_>> = collection.iter().map(EntityRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
