//! crates/mind_mapper_core/src/prompts.rs
//!
//! System instructions sent to the completion provider.
//!
//! Each prompt pins down one of the four JSON shapes the normalizer accepts:
//! a whole map or a list of new branches, with or without emojis.

const MAP_WITH_EMOJIS: &str = r#"You are an expert at building concise, hierarchical mind maps about: "{topic}".

CRITICAL REQUIREMENTS:
1. ALWAYS answer in JSON, with no extra text.
2. Every node MUST have two fields: "text" (the node's wording) and "emoji" (one fitting Unicode emoji).
3. Root structure: {"text": "{topic}", "emoji": "🧠", "children": [...]}
4. Every element of "children" also has "text", "emoji" and optionally "children".
5. Pick emojis that VISUALLY represent the topic (e.g. ☀️ for light, 🌙 for darkness, 📚 for learning).
6. Use ONLY single Unicode emojis (e.g. "🔬", "💡", "🌍").
7. Aim for 2-4 levels of nesting to start with.

Example of a valid structure:
{
  "text": "Photosynthesis",
  "emoji": "🌱",
  "children": [
    {"text": "Light phase", "emoji": "☀️", "children": [...]},
    {"text": "Dark phase", "emoji": "🌙"}
  ]
}"#;

const MAP_PLAIN: &str = r#"You are an expert at building concise, hierarchical mind maps about: "{topic}".

CRITICAL REQUIREMENTS:
1. ALWAYS answer in JSON, with no extra text.
2. Root structure: {"content": "{topic}", "children": [...]}
3. Every node has a "content" key with its wording. Nodes with sub-points have "children".
4. Aim for 2-4 levels of nesting to start with.

Example of a valid structure:
{
  "content": "Photosynthesis",
  "children": [
    {"content": "Light phase", "children": [...]},
    {"content": "Dark phase"}
  ]
}"#;

const EXPAND_WITH_EMOJIS: &str = r#"Context: "{context}". Generate ONLY the list of sub-points for the LAST element.

CRITICAL REQUIREMENTS:
1. Answer in JSON as an object holding a "nodes" key with a list.
2. Every list element MUST have "text" (the wording) and "emoji" (one fitting Unicode emoji).
3. Format: {"nodes": [{"text": "...", "emoji": "🔥"}, {"text": "...", "emoji": "💧"}]}
4. Pick emojis that VISUALLY represent the topic (e.g. 🔬 science, 💡 idea, 🌍 world).
5. Use ONLY single Unicode emojis.
6. If there are no sub-points, return: {"nodes": []}

Example of a valid answer:
{
  "nodes": [
    {"text": "Definition", "emoji": "📖"},
    {"text": "Examples", "emoji": "💡"},
    {"text": "Applications", "emoji": "🔧"}
  ]
}"#;

const EXPAND_PLAIN: &str = r#"Context: "{context}". Generate ONLY the list of sub-points for the LAST element.

CRITICAL REQUIREMENTS:
1. Answer in JSON as an object holding a "nodes" key with a list.
2. Every list element has a "content" field with the node's wording.
3. Format: {"nodes": [{"content": "..."}, {"content": "..."}]}
4. If there are no sub-points, return: {"nodes": []}

Example of a valid answer:
{
  "nodes": [
    {"content": "Definition"},
    {"content": "Examples"},
    {"content": "Applications"}
  ]
}"#;

/// Instructions for generating a whole map about `topic`.
pub fn generate_map_prompt(topic: &str, emojis_enabled: bool) -> String {
    let template = if emojis_enabled { MAP_WITH_EMOJIS } else { MAP_PLAIN };
    template.replace("{topic}", topic)
}

/// Instructions for expanding the last node of `path`.
pub fn expand_node_prompt(path: &[String], emojis_enabled: bool) -> String {
    let template = if emojis_enabled { EXPAND_WITH_EMOJIS } else { EXPAND_PLAIN };
    template.replace("{context}", &expansion_context(path))
}

/// The breadcrumb shown to the model, e.g. `Biology -> Cells -> Nucleus`.
pub fn expansion_context(path: &[String]) -> String {
    path.join(" -> ")
}
