//! crates/mind_mapper_core/src/repair.rs
//!
//! Backfills the canonical fields of legacy map documents.
//!
//! Older clients stored maps under `mapStructure`, `content` or `mapData`
//! with or without a `name`. A repaired document has `name` and `mapData`,
//! plus a `content` mirror whenever it had to be created. Repair only ever
//! adds fields, and a repaired document repairs to nothing.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{fields, stamp_last_updated, value_to_text, MapFields};

/// What repairing one document amounts to.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    /// The document already has `name` and `mapData`.
    Skipped,
    /// Fields to merge into the stored document.
    Update(MapFields),
}

/// Computes the field updates that bring `doc` to the canonical shape.
pub fn repair(doc: &MapFields, doc_id: &str, now: DateTime<Utc>) -> RepairOutcome {
    let has_name = doc.contains_key(fields::NAME);
    let has_map_data = doc.contains_key(fields::MAP_DATA);
    if has_name && has_map_data {
        return RepairOutcome::Skipped;
    }

    let mut updates = MapFields::new();

    if !has_name {
        updates.insert(fields::NAME.to_string(), Value::String(derive_name(doc, doc_id)));
    }

    if !has_map_data {
        let map_data = derive_map_data(doc);
        if !doc.contains_key(fields::CONTENT) {
            updates.insert(fields::CONTENT.to_string(), map_data.clone());
        }
        updates.insert(fields::MAP_DATA.to_string(), map_data);
    }

    stamp_last_updated(&mut updates, now);
    RepairOutcome::Update(updates)
}

/// `"Mapa "` followed by the first eight characters of the id.
pub fn placeholder_name(doc_id: &str) -> String {
    let prefix: String = doc_id.chars().take(8).collect();
    format!("Mapa {prefix}")
}

fn derive_name(doc: &MapFields, doc_id: &str) -> String {
    if let Some(structure) = doc.get(fields::MAP_STRUCTURE) {
        return nested_content(structure).unwrap_or_else(|| placeholder_name(doc_id));
    }
    if let Some(map_data) = doc.get(fields::MAP_DATA) {
        return nested_content(map_data).unwrap_or_else(|| placeholder_name(doc_id));
    }
    match doc.get(fields::CONTENT) {
        Some(content) => nested_content(content).unwrap_or_else(|| value_to_text(content)),
        None => placeholder_name(doc_id),
    }
}

/// The text of a tree's root `content`, when the value is an object that has one.
fn nested_content(tree: &Value) -> Option<String> {
    tree.as_object()?.get(fields::CONTENT).map(value_to_text)
}

fn derive_map_data(doc: &MapFields) -> Value {
    if let Some(structure) = doc.get(fields::MAP_STRUCTURE) {
        return structure.clone();
    }
    if let Some(content) = doc.get(fields::CONTENT) {
        return content.clone();
    }
    let mut rest = doc.clone();
    for key in [fields::NAME, fields::CREATED_AT, fields::LAST_UPDATED] {
        rest.remove(key);
    }
    Value::Object(rest)
}

/// Whether a re-read document passes post-migration verification.
pub fn is_canonical(doc: &MapFields) -> bool {
    doc.contains_key(fields::NAME)
        && (doc.contains_key(fields::MAP_DATA) || doc.contains_key(fields::CONTENT))
}
