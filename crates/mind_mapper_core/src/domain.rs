//! crates/mind_mapper_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//!
//! Mind maps travel as JSON end to end, so the tree and the stored document
//! are expressed in terms of `serde_json` values rather than closed structs.
//! Stored documents in particular may carry legacy field sets that only the
//! repair logic knows how to interpret.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Field names used by stored map documents.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const NAME: &str = "name";
    pub const CONTENT: &str = "content";
    pub const MAP_DATA: &str = "mapData";
    pub const MAP_STRUCTURE: &str = "mapStructure";
    pub const CREATED_AT: &str = "createdAt";
    pub const LAST_UPDATED: &str = "lastUpdated";
}

/// The open field set of one stored map document.
pub type MapFields = Map<String, Value>;

/// A canonical mind-map node: `content` plus ordered `children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapNode {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MindMapNode>,
}

impl MindMapNode {
    pub fn leaf(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            children: Vec::new(),
        }
    }
}

/// A map document as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMap {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fields: MapFields,
}

impl StoredMap {
    /// The document's fields with its id added under `id`, as returned to clients.
    pub fn into_listing(self) -> Value {
        let mut doc = self.fields;
        doc.insert("id".to_string(), Value::String(self.id.to_string()));
        Value::Object(doc)
    }
}

/// Identifies a registered user.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login - contains the password hash
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

//=========================================================================================
// Write-side serialization rules
//=========================================================================================

/// Renders a JSON value as display text: strings verbatim, anything else as JSON.
///
/// A present `null` is a value like any other and renders as `null`; only a
/// missing key falls back to a default at the call sites.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn timestamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339())
}

/// Inserts the tree under `content` and its `mapData` mirror.
///
/// Every write this service performs goes through here, so the two keys can
/// never diverge for documents it created or updated.
pub fn insert_tree(doc: &mut MapFields, tree: Value) {
    doc.insert(fields::MAP_DATA.to_string(), tree.clone());
    doc.insert(fields::CONTENT.to_string(), tree);
}

/// Builds the field set of a freshly created map.
pub fn new_map_fields(title: &str, tree: Value, now: DateTime<Utc>) -> MapFields {
    let mut doc = MapFields::new();
    doc.insert(fields::TITLE.to_string(), Value::String(title.to_string()));
    insert_tree(&mut doc, tree);
    doc.insert(fields::CREATED_AT.to_string(), timestamp(now));
    doc.insert(fields::LAST_UPDATED.to_string(), timestamp(now));
    doc
}

/// Builds a partial update for a map whose tree and/or title changed.
pub fn map_update_fields(
    tree: Option<Value>,
    title: Option<Value>,
    now: DateTime<Utc>,
) -> MapFields {
    let mut doc = MapFields::new();
    if let Some(tree) = tree {
        insert_tree(&mut doc, tree);
    }
    if let Some(title) = title {
        doc.insert(fields::TITLE.to_string(), title);
    }
    doc.insert(fields::LAST_UPDATED.to_string(), timestamp(now));
    doc
}

/// Stamps `lastUpdated` on an update set.
pub fn stamp_last_updated(doc: &mut MapFields, now: DateTime<Utc>) {
    doc.insert(fields::LAST_UPDATED.to_string(), timestamp(now));
}

/// Picks the display title for a new map when the client sent none.
pub fn fallback_title(tree: &Value) -> String {
    tree.get(fields::CONTENT)
        .map(value_to_text)
        .unwrap_or_else(|| "Bez nazwy".to_string())
}

/// Mirrors the usual notion of an "empty" JSON value: null, false, zero,
/// and empty strings, arrays and objects.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
