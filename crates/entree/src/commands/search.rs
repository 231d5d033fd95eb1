//! Substring search and view filtering.
//!
//! Matching is a plain case-insensitive `contains` over a fixed field order; the first
//! field that matches wins and no ranking is applied. Results keep collection order.

use crate::model::{AttributeId, Collection, Entity, EntityFilter, EntitySystem};

/// The field that satisfied a search, in match order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedField {
    EntityName,
    EntitySystem,
    EntityType,
    EntityDescription,
    AttributeName(AttributeId),
    AttributeSystem(AttributeId),
    AttributeDescription(AttributeId),
}

#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub entity: &'a Entity,
    pub field: MatchedField,
}

/// Entities matching `query`. A blank query matches nothing.
pub fn search<'a>(collection: &'a Collection, query: &str) -> Vec<&'a Entity> {
    search_hits(collection, query)
        .into_iter()
        .map(|hit| hit.entity)
        .collect()
}

/// Like [`search`], but also reports which field matched first.
pub fn search_hits<'a>(collection: &'a Collection, query: &str) -> Vec<SearchHit<'a>> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    collection
        .iter()
        .filter_map(|entity| {
            first_match(entity, &needle).map(|field| SearchHit { entity, field })
        })
        .collect()
}

fn first_match(entity: &Entity, needle: &str) -> Option<MatchedField> {
    let hit = |text: &str| text.to_lowercase().contains(needle);
    let hit_opt = |text: &Option<String>| text.as_deref().is_some_and(|t| hit(t));

    if hit(&entity.name) {
        return Some(MatchedField::EntityName);
    }
    if hit(&entity.system) {
        return Some(MatchedField::EntitySystem);
    }
    if hit_opt(&entity.entity_type) {
        return Some(MatchedField::EntityType);
    }
    if hit_opt(&entity.description) {
        return Some(MatchedField::EntityDescription);
    }
    entity.attributes.iter().find_map(|attr| {
        if hit(&attr.name) {
            Some(MatchedField::AttributeName(attr.attribute_id))
        } else if hit(&attr.system) {
            Some(MatchedField::AttributeSystem(attr.attribute_id))
        } else if hit_opt(&attr.description) {
            Some(MatchedField::AttributeDescription(attr.attribute_id))
        } else {
            None
        }
    })
}

/// System filter: `All` or an empty name lets everything through, `Both` selects
/// dual-system entities, anything else is a case-sensitive substring test.
pub fn matches_system(entity: &Entity, system: &EntitySystem) -> bool {
    match system {
        EntitySystem::All => true,
        EntitySystem::Both => entity.is_dual_system(),
        other => {
            let name = other.as_str();
            name.is_empty() || entity.system.contains(name)
        }
    }
}

/// The filtered view: system filter AND search term. A blank term is ignored.
pub fn apply_filter<'a>(collection: &'a Collection, filter: &EntityFilter) -> Vec<&'a Entity> {
    let term = filter
        .search_term
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(str::to_lowercase);

    collection
        .iter()
        .filter(|entity| {
            filter
                .system
                .as_ref()
                .map_or(true, |system| matches_system(entity, system))
        })
        .filter(|entity| {
            term.as_deref()
                .map_or(true, |needle| first_match(entity, needle).is_some())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attribute;

    fn entity(id: i64, name: &str, system: &str) -> Entity {
        let mut e = Entity::new(id, name, None, 1);
        e.system = system.to_string();
        e
    }

    fn sample() -> Collection {
        let mut valve = entity(1, "Valve", "EAM");
        valve.description = Some("Controls flow".to_string());
        let mut pipe = entity(2, "Pipe", "GIS-WN");
        let mut diameter = Attribute::new(1, "Diameter", &pipe);
        diameter.description = Some("Inner size in mm".to_string());
        pipe.attributes.push(diameter);
        let mut meter = entity(3, "Meter", "iPen, GIS-WN");
        meter.entity_type = Some("Standard Entity".to_string());
        Collection::new(vec![valve, pipe, meter])
    }

    fn ids(entities: &[&Entity]) -> Vec<i64> {
        entities.iter().map(|e| e.entity_id).collect()
    }

    #[test]
    fn blank_query_matches_nothing() {
        assert!(search(&sample(), "").is_empty());
        assert!(search(&sample(), "   ").is_empty());
    }

    #[test]
    fn search_is_case_insensitive() {
        let collection = sample();
        assert_eq!(ids(&search(&collection, "eam")), vec![1]);
        assert_eq!(ids(&search(&collection, "VALVE")), vec![1]);
    }

    #[test]
    fn search_reaches_attributes_and_descriptions() {
        let collection = sample();
        assert_eq!(ids(&search(&collection, "diam")), vec![2]);
        assert_eq!(ids(&search(&collection, "inner size")), vec![2]);
        assert_eq!(ids(&search(&collection, "flow")), vec![1]);
        assert_eq!(ids(&search(&collection, "standard")), vec![3]);
    }

    #[test]
    fn hits_report_first_matching_field() {
        let collection = sample();
        let hits = search_hits(&collection, "gis");
        let fields: Vec<_> = hits.iter().map(|h| h.field).collect();
        assert_eq!(
            fields,
            vec![MatchedField::EntitySystem, MatchedField::EntitySystem]
        );

        let hits = search_hits(&collection, "mm");
        assert_eq!(hits[0].field, MatchedField::AttributeDescription(1));
    }

    #[test]
    fn system_filter() {
        let collection = sample();
        let by = |system: EntitySystem| {
            ids(&apply_filter(&collection, &EntityFilter::default().with_system(system)))
        };
        assert_eq!(by(EntitySystem::All), vec![1, 2, 3]);
        assert_eq!(by(EntitySystem::Both), vec![3]);
        assert_eq!(by(EntitySystem::GisWn), vec![2, 3]);
        assert_eq!(by(EntitySystem::Eam), vec![1]);
        assert_eq!(by(EntitySystem::Other(String::new())), vec![1, 2, 3]);
    }

    #[test]
    fn system_filter_is_case_sensitive() {
        let collection = sample();
        let filter = EntityFilter::default().with_system(EntitySystem::Other("ipen".into()));
        assert!(apply_filter(&collection, &filter).is_empty());
    }

    #[test]
    fn filter_combines_system_and_term() {
        let collection = sample();
        let filter = EntityFilter::default()
            .with_system(EntitySystem::GisWn)
            .with_search_term("standard");
        assert_eq!(ids(&apply_filter(&collection, &filter)), vec![3]);
    }

    #[test]
    fn blank_term_is_no_filter() {
        let collection = sample();
        let filter = EntityFilter::default().with_search_term("  ");
        assert_eq!(apply_filter(&collection, &filter).len(), 3);
        assert_eq!(apply_filter(&collection, &EntityFilter::default()).len(), 3);
    }
}
