//! services/api/src/web/generation.rs
//!
//! Handlers that talk to the completion provider: whole-map generation,
//! single-branch expansion and free-text explanations.

use axum::{extract::State, http::StatusCode, response::Json};
use mind_mapper_core::{
    domain::{is_blank, value_to_text},
    normalize::{normalize_expansion, normalize_generated_map},
    prompts, MindMapNode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::web::extract::{non_blank_text, truthy, ApiJson};
use crate::web::rest::{error_response, ErrorBody, HandlerError};
use crate::web::state::AppState;

/// Message returned when the provider call or its output fails.
const PROVIDER_FAILURE: &str = "An error occurred while communicating with the AI.";

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMapRequest {
    #[schema(value_type = String)]
    pub topic: Option<Value>,
    #[serde(default, deserialize_with = "truthy")]
    pub emojis_enabled: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpandNodeRequest {
    /// Node contents from the root down to the node being expanded.
    #[schema(value_type = Vec<String>)]
    pub path: Option<Value>,
    #[serde(default, deserialize_with = "truthy")]
    pub emojis_enabled: bool,
}

/// One new child produced by an expansion.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExpandedNode {
    pub content: String,
}

impl From<MindMapNode> for ExpandedNode {
    fn from(node: MindMapNode) -> Self {
        Self {
            content: node.content,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExplanationRequest {
    #[schema(value_type = String)]
    pub prompt: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExplanationResponse {
    pub explanation: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Generate a complete mind map for a topic.
#[utoipa::path(
    post,
    path = "/generate-map",
    request_body = GenerateMapRequest,
    responses(
        (status = 200, description = "The generated tree of {content, children} nodes"),
        (status = 400, description = "No topic given", body = ErrorBody),
        (status = 500, description = "Provider failure or unusable output", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn generate_map_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<GenerateMapRequest>,
) -> Result<Json<Value>, HandlerError> {
    let topic = non_blank_text(req.topic)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "No topic given"))?;

    let prompt = prompts::generate_map_prompt(&topic, req.emojis_enabled);
    let raw = request_json(&state, &prompt).await?;

    let tree = normalize_generated_map(raw, req.emojis_enabled).map_err(|e| {
        error!("Generated map could not be normalized: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, PROVIDER_FAILURE)
    })?;

    info!(%topic, emojis = req.emojis_enabled, "Map generated");
    Ok(Json(tree))
}

/// Expand a single branch of a mind map.
#[utoipa::path(
    post,
    path = "/expand-node",
    request_body = ExpandNodeRequest,
    responses(
        (status = 200, description = "New children for the last node of the path", body = [ExpandedNode]),
        (status = 400, description = "No path given", body = ErrorBody),
        (status = 500, description = "Provider failure or unparseable output", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn expand_node_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ExpandNodeRequest>,
) -> Result<Json<Vec<ExpandedNode>>, HandlerError> {
    let path = req
        .path
        .filter(|p| !is_blank(p))
        .map(path_segments)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "No path to expand given"))?;

    let prompt = prompts::expand_node_prompt(&path, req.emojis_enabled);
    let raw = request_json(&state, &prompt).await?;

    let nodes: Vec<ExpandedNode> = normalize_expansion(&raw, req.emojis_enabled)
        .into_iter()
        .map(ExpandedNode::from)
        .collect();

    info!(
        context = %prompts::expansion_context(&path),
        count = nodes.len(),
        "Node expanded"
    );
    Ok(Json(nodes))
}

/// Generate a free-text explanation for a prompt.
#[utoipa::path(
    post,
    path = "/get-explanation",
    request_body = ExplanationRequest,
    responses(
        (status = 200, description = "The explanation text", body = ExplanationResponse),
        (status = 400, description = "No prompt given", body = ErrorBody),
        (status = 500, description = "Provider failure", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn explanation_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ExplanationRequest>,
) -> Result<Json<ExplanationResponse>, HandlerError> {
    let prompt = non_blank_text(req.prompt)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "No prompt given"))?;

    let explanation = state.completion.complete_text(&prompt).await.map_err(|e| {
        error!("Explanation request failed: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(ExplanationResponse { explanation }))
}

/// A list path keeps its items in order; any other value is a single segment.
fn path_segments(path: Value) -> Vec<String> {
    match path {
        Value::Array(items) => items.iter().map(value_to_text).collect(),
        other => vec![value_to_text(&other)],
    }
}

/// Runs a JSON-mode completion and parses its text.
async fn request_json(state: &AppState, prompt: &str) -> Result<Value, HandlerError> {
    let text = state.completion.complete_json(prompt).await.map_err(|e| {
        error!("Completion request failed: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, PROVIDER_FAILURE)
    })?;

    serde_json::from_str(&text).map_err(|e| {
        error!("Completion was not valid JSON: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, PROVIDER_FAILURE)
    })
}
