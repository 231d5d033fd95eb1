//! # Rendering Module
//!
//! Turns library values into terminal text. Layout (indentation, column alignment,
//! truncation) is computed here with `unicode-width`; colors come from `console` and
//! are dropped automatically when stdout is not a terminal.

use console::style;
use entree::commands::{DeletePreview, IntegrityReport, MatchedField, SearchHit};
use entree::model::{Collection, Entity, EntityId};
use entree::tree::{self, ChildIndex};
use std::collections::HashSet;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const LINE_WIDTH: usize = 100;
const INDENT: &str = "  ";

/// Entities in display order: each root followed by its subtree, depth first.
/// Orphans are shown as roots; anything only reachable through a cycle comes last.
fn tree_order(collection: &Collection) -> Vec<(&Entity, usize)> {
    let index = ChildIndex::build(collection);
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(collection.len());

    let starts = tree::roots(collection)
        .into_iter()
        .chain(tree::orphans(collection))
        .map(|e| e.entity_id);
    for id in starts {
        walk(collection, &index, id, 0, &mut seen, &mut out);
    }
    for entity in collection.iter() {
        if seen.insert(entity.entity_id) {
            out.push((entity, 0));
        }
    }
    out
}

fn walk<'a>(
    collection: &'a Collection,
    index: &ChildIndex,
    id: EntityId,
    depth: usize,
    seen: &mut HashSet<EntityId>,
    out: &mut Vec<(&'a Entity, usize)>,
) {
    if !seen.insert(id) {
        return;
    }
    let Some(entity) = collection.get(id) else {
        return;
    };
    out.push((entity, depth));
    for &child in index.children(id) {
        walk(collection, index, child, depth + 1, seen, out);
    }
}

/// Renders the hierarchy as an indented tree. When `visible` is given only those
/// entities are printed, still in tree order and at their tree depth.
pub fn render_tree(collection: &Collection, visible: Option<&HashSet<EntityId>>) -> String {
    let rows: Vec<_> = tree_order(collection)
        .into_iter()
        .filter(|(e, _)| visible.is_none_or(|v| v.contains(&e.entity_id)))
        .collect();
    if rows.is_empty() {
        return "No entities found.\n".to_string();
    }

    let id_width = rows
        .iter()
        .map(|(e, _)| e.entity_id.to_string().len())
        .max()
        .unwrap_or(1);
    let label = |e: &Entity, depth: usize| format!("{}{}", INDENT.repeat(depth), e.name);
    let name_width = rows
        .iter()
        .map(|(e, d)| label(e, *d).width())
        .max()
        .unwrap_or(0)
        .min(LINE_WIDTH / 2);

    let mut out = String::new();
    for (entity, depth) in rows {
        let text = truncate_to_width(&label(entity, depth), name_width);
        let padding = " ".repeat(name_width.saturating_sub(text.width()));
        out.push_str(&format!(
            "{:>w$}  {}{}  {}  {}\n",
            style(entity.entity_id).dim(),
            style(text).bold(),
            padding,
            style(system_label(entity)).cyan(),
            style(attribute_count(entity)).dim(),
            w = id_width,
        ));
    }
    out
}

fn system_label(entity: &Entity) -> String {
    if entity.system.is_empty() {
        "-".to_string()
    } else {
        entity.system.clone()
    }
}

fn attribute_count(entity: &Entity) -> String {
    match entity.attributes.len() {
        1 => "1 attribute".to_string(),
        n => format!("{} attributes", n),
    }
}

/// Full view of one entity and its attributes.
pub fn render_entity(collection: &Collection, entity: &Entity) -> String {
    let mut out = format!(
        "{} {}\n",
        style(format!("#{}", entity.entity_id)).yellow(),
        style(&entity.name).bold()
    );

    let path: Vec<_> = tree::path_to(collection, entity.entity_id)
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    let parent = match entity.parent_id {
        Some(pid) if collection.contains(pid) => pid.to_string(),
        Some(pid) => format!("{} (missing)", pid),
        None => "-".to_string(),
    };
    let children = if entity.child_ids.is_empty() {
        "-".to_string()
    } else {
        entity
            .child_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let fields = [
        ("Path", path.join(" / ")),
        ("System", system_label(entity)),
        ("Type", entity.entity_type.clone().unwrap_or_else(|| "-".into())),
        ("Level", entity.hierarchy_level.to_string()),
        ("Parent", parent),
        ("Children", children),
        ("Description", entity.description.clone().unwrap_or_else(|| "-".into())),
    ];
    for (key, value) in fields {
        out.push_str(&format!("  {:<12} {}\n", style(key).dim(), value));
    }

    if entity.attributes.is_empty() {
        out.push_str(&format!("  {}\n", style("No attributes").dim()));
        return out;
    }
    out.push_str("\n  Attributes\n");
    let name_width = entity
        .attributes
        .iter()
        .map(|a| a.name.width())
        .max()
        .unwrap_or(0);
    for attr in &entity.attributes {
        let marker = if attr.primary_key.is_yes() { "*" } else { " " };
        let padding = " ".repeat(name_width - attr.name.width());
        let description = attr
            .description
            .as_deref()
            .map(|d| truncate_to_width(d, LINE_WIDTH / 2))
            .unwrap_or_default();
        out.push_str(&format!(
            "  {:>4} {}{}{}  {}  {}\n",
            style(attr.attribute_id).dim(),
            style(marker).yellow(),
            attr.name,
            padding,
            style(&attr.system).cyan(),
            description
        ));
    }
    out
}

fn field_label(field: MatchedField) -> String {
    match field {
        MatchedField::EntityName => "name".to_string(),
        MatchedField::EntitySystem => "system".to_string(),
        MatchedField::EntityType => "type".to_string(),
        MatchedField::EntityDescription => "description".to_string(),
        MatchedField::AttributeName(id) => format!("attribute {} name", id),
        MatchedField::AttributeSystem(id) => format!("attribute {} system", id),
        MatchedField::AttributeDescription(id) => format!("attribute {} description", id),
    }
}

pub fn render_search_hits(hits: &[SearchHit<'_>]) -> String {
    if hits.is_empty() {
        return "No matches.\n".to_string();
    }
    hits.iter()
        .map(|hit| {
            format!(
                "{:>4}  {}  {}\n",
                style(hit.entity.entity_id).dim(),
                style(&hit.entity.name).bold(),
                style(format!("({})", field_label(hit.field))).dim()
            )
        })
        .collect()
}

pub fn render_delete_preview(preview: &DeletePreview<'_>) -> String {
    let mut out = format!(
        "Delete {} {}",
        style(format!("#{}", preview.target.entity_id)).yellow(),
        style(&preview.target.name).bold()
    );
    match preview.descendant_count {
        0 => {}
        1 => out.push_str(" and 1 descendant"),
        n => out.push_str(&format!(" and {} descendants", n)),
    }
    out.push_str(&format!(
        " ({} attributes in total)?",
        preview.attribute_count
    ));
    out
}

pub fn render_report(report: &IntegrityReport) -> String {
    if report.is_clean() {
        return format!("{}\n", style("No issues found.").green());
    }
    let mut out = String::new();
    for issue in &report.issues {
        let tag = if issue.is_repairable() {
            style("fixable").yellow()
        } else {
            style("manual").red()
        };
        out.push_str(&format!("  [{}] {}\n", tag, issue));
    }
    out
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut current_width = 0;
    let limit = max_width.saturating_sub(1);

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > limit {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}
