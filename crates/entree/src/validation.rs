//! Schema checks for constructed records and for form drafts.
//!
//! Parsing is deliberately tolerant (see [`crate::codec`]); validation is the strict
//! counterpart used when a record is built from user input. A failed check blocks the
//! corresponding create from committing.

use crate::error::{EntreeError, Result};
use crate::model::{Attribute, Entity, EntityId, EntitySystem, PrimaryKey};

pub fn validate_attribute(attribute: &Attribute) -> Result<()> {
    if attribute.name.trim().is_empty() {
        return Err(EntreeError::Validation(
            "Attribute name is required".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_entity(entity: &Entity) -> Result<()> {
    if entity.name.trim().is_empty() {
        return Err(EntreeError::Validation("Entity name is required".to_string()));
    }
    if entity.hierarchy_level < 1 {
        return Err(EntreeError::Validation(format!(
            "Entity {} has hierarchy level {}, expected at least 1",
            entity.entity_id, entity.hierarchy_level
        )));
    }
    for attribute in &entity.attributes {
        validate_attribute(attribute)?;
        if attribute.parent_id != entity.entity_id {
            return Err(EntreeError::Validation(format!(
                "Attribute {} belongs to entity {} but is listed under entity {}",
                attribute.attribute_id, attribute.parent_id, entity.entity_id
            )));
        }
    }
    Ok(())
}

/// User-supplied fields for a new entity. Ids, level and child list are derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDraft {
    pub name: String,
    pub description: Option<String>,
    /// Defaults to EAM when absent.
    pub system: Option<String>,
    pub entity_type: Option<String>,
    pub parent_id: Option<EntityId>,
}

impl EntityDraft {
    pub const DEFAULT_SYSTEM: &'static str = "EAM";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn with_parent(mut self, parent_id: EntityId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn system_or_default(&self) -> &str {
        self.system.as_deref().unwrap_or(Self::DEFAULT_SYSTEM)
    }

    /// Form rules: a name is required and the system must be one a form can assign
    /// (EAM, iPen, GIS-WN or Both).
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(EntreeError::Validation("Entity name is required".to_string()));
        }
        let system = self.system_or_default();
        let assignable = EntitySystem::ASSIGNABLE
            .iter()
            .any(|known| known.as_str() == system);
        if !assignable {
            return Err(EntreeError::Validation(format!(
                "Unknown entity system '{}': expected one of EAM, iPen, GIS-WN, Both",
                system
            )));
        }
        Ok(())
    }
}

/// User-supplied fields for a new attribute. The system defaults to the owner's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDraft {
    pub name: String,
    pub description: Option<String>,
    pub primary_key: PrimaryKey,
    pub system: Option<String>,
}

impl AttributeDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_primary_key(mut self, primary_key: PrimaryKey) -> Self {
        self.primary_key = primary_key;
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(EntreeError::Validation(
                "Attribute name is required".to_string(),
            ));
        }
        Ok(())
    }
}
