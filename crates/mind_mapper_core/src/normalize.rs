//! crates/mind_mapper_core/src/normalize.rs
//!
//! Turns raw model completions into canonical mind-map trees.
//!
//! Two dialects come back from the model: the plain one already uses
//! `content`, the emoji one uses `text` + `emoji`. Whole-map responses are a
//! single root node; expansion responses are a flat list of new children,
//! either bare or wrapped under `children` or `nodes`.

use serde_json::{Map, Value};

use crate::domain::{fields, value_to_text, MindMapNode};

/// Emoji used when the model leaves a node undecorated.
pub const DEFAULT_EMOJI: &str = "📌";

const TEXT: &str = "text";
const EMOJI: &str = "emoji";
const CHILDREN: &str = "children";
const NODES: &str = "nodes";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Mind map node at {0} is not a JSON object")]
    NotAnObject(String),
}

//=========================================================================================
// Whole-map generation
//=========================================================================================

/// Normalizes a generated map into canonical nodes.
///
/// With emojis disabled the plain dialect was requested and the value is
/// returned as is. With emojis enabled every node gets
/// `content = "<emoji> <text>"` and loses its `text`/`emoji` keys. A
/// `children` value that is not an array is left in place and not descended
/// into.
pub fn normalize_generated_map(raw: Value, emojis_enabled: bool) -> Result<Value, NormalizeError> {
    if !emojis_enabled {
        return Ok(raw);
    }
    let mut root = raw;
    decorate_node(&mut root, "$")?;
    Ok(root)
}

fn decorate_node(node: &mut Value, path: &str) -> Result<(), NormalizeError> {
    let node = node
        .as_object_mut()
        .ok_or_else(|| NormalizeError::NotAnObject(path.to_string()))?;

    let content = emoji_content(node);
    node.insert(fields::CONTENT.to_string(), Value::String(content));
    node.remove(TEXT);
    node.remove(EMOJI);

    if let Some(Value::Array(children)) = node.get_mut(CHILDREN) {
        for (index, child) in children.iter_mut().enumerate() {
            decorate_node(child, &format!("{path}.children[{index}]"))?;
        }
    }
    Ok(())
}

fn emoji_content(node: &Map<String, Value>) -> String {
    let emoji = node
        .get(EMOJI)
        .map(value_to_text)
        .unwrap_or_else(|| DEFAULT_EMOJI.to_string());
    let text = node
        .get(TEXT)
        .or_else(|| node.get(fields::CONTENT))
        .map(value_to_text)
        .unwrap_or_default();
    format!("{emoji} {text}")
}

//=========================================================================================
// Single-branch expansion
//=========================================================================================

/// The shapes an expansion response is recognised in.
#[derive(Debug, PartialEq)]
pub enum ExpansionShape<'a> {
    Bare(&'a [Value]),
    Children(&'a [Value]),
    Nodes(&'a [Value]),
    Absent,
}

impl<'a> ExpansionShape<'a> {
    pub fn detect(raw: &'a Value) -> Self {
        match raw {
            Value::Array(items) => Self::Bare(items),
            Value::Object(map) => match (map.get(CHILDREN), map.get(NODES)) {
                (Some(Value::Array(items)), _) => Self::Children(items),
                (_, Some(Value::Array(items))) => Self::Nodes(items),
                _ => Self::Absent,
            },
            _ => Self::Absent,
        }
    }

    pub fn items(&self) -> &'a [Value] {
        match self {
            Self::Bare(items) | Self::Children(items) | Self::Nodes(items) => items,
            Self::Absent => &[],
        }
    }
}

/// Extracts the new child nodes from an expansion response.
///
/// Never fails: items that are not objects, lack usable text, or trim to
/// nothing are dropped. Input order is preserved.
pub fn normalize_expansion(raw: &Value, emojis_enabled: bool) -> Vec<MindMapNode> {
    ExpansionShape::detect(raw)
        .items()
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            if emojis_enabled {
                emoji_expansion_item(item)
            } else {
                plain_expansion_item(item)
            }
        })
        .collect()
}

fn emoji_expansion_item(item: &Map<String, Value>) -> Option<MindMapNode> {
    let emoji = item
        .get(EMOJI)
        .map(value_to_text)
        .unwrap_or_else(|| DEFAULT_EMOJI.to_string());
    let text = match item.get(TEXT).or_else(|| item.get(fields::CONTENT)) {
        Some(Value::String(text)) => text.trim(),
        Some(_) => return None,
        None => "",
    };
    if text.is_empty() {
        return None;
    }
    Some(MindMapNode::leaf(format!("{emoji} {text}")))
}

fn plain_expansion_item(item: &Map<String, Value>) -> Option<MindMapNode> {
    let content = item.get(fields::CONTENT)?.as_str()?.trim();
    (!content.is_empty()).then(|| MindMapNode::leaf(content))
}
