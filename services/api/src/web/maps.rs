//! services/api/src/web/maps.rs
//!
//! Handlers for the per-user map documents: listing, creation, updates and
//! the legacy migration.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use futures::TryStreamExt;
use mind_mapper_core::{
    domain::{fallback_title, fields, is_blank, map_update_fields, new_map_fields, MapFields},
    migrate_user_maps, MigrationReport, StoredMap,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::extract::{non_blank_text, present, ApiJson};
use crate::web::rest::{error_response, port_error_response, ErrorBody, HandlerError};
use crate::web::state::AppState;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMapRequest {
    /// The map tree; stored under both `content` and `mapData`.
    #[schema(value_type = Object)]
    pub content: Option<Value>,
    #[schema(value_type = String)]
    pub title: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateMapResponse {
    pub id: Uuid,
    pub title: String,
    #[schema(value_type = Object)]
    pub content: Value,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMapByBodyRequest {
    #[schema(value_type = String)]
    pub document_id: Option<Value>,
    /// Takes precedence over `newMapContent` whenever the key is present.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Object)]
    pub new_map_data: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Object)]
    pub new_map_content: Option<Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMapRequest {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Object)]
    pub content: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = String)]
    pub title: Option<Value>,
    /// Any other keys; they are not stored but still count as an update.
    #[serde(flatten)]
    #[schema(ignore)]
    pub other: MapFields,
}

impl UpdateMapRequest {
    fn is_empty(&self) -> bool {
        self.content.is_none() && self.title.is_none() && self.other.is_empty()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdateMapResponse {
    pub id: String,
    pub updated: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MigrationReportBody {
    pub migrated: usize,
    pub skipped: usize,
    pub total: usize,
    pub errors: Vec<String>,
}

impl From<MigrationReport> for MigrationReportBody {
    fn from(report: MigrationReport) -> Self {
        Self {
            migrated: report.migrated,
            skipped: report.skipped,
            total: report.total,
            errors: report.errors,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// List every map of the calling user.
#[utoipa::path(
    get,
    path = "/get-maps",
    responses(
        (status = 200, description = "Stored documents with their `id` added"),
        (status = 500, description = "Store failure", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn list_maps_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<Value>>, HandlerError> {
    let maps: Vec<StoredMap> = state
        .maps
        .stream_maps(user_id)
        .try_collect()
        .await
        .map_err(|e| {
            error!("Failed to list maps for {}: {}", user_id, e);
            port_error_response(e)
        })?;

    for map in &maps {
        if !map.fields.contains_key(fields::TITLE) {
            warn!(map_id = %map.id, "Map is missing its 'title' field");
        }
        if !map.fields.contains_key(fields::CONTENT) {
            warn!(map_id = %map.id, "Map is missing its 'content' field");
        }
    }

    info!(%user_id, count = maps.len(), "Returning maps");
    Ok(Json(maps.into_iter().map(StoredMap::into_listing).collect()))
}

/// Create a new map document.
#[utoipa::path(
    post,
    path = "/create-map",
    request_body = CreateMapRequest,
    responses(
        (status = 201, description = "Map created", body = CreateMapResponse),
        (status = 400, description = "No content given", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_map_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    ApiJson(req): ApiJson<CreateMapRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let content = req
        .content
        .filter(|c| !is_blank(c))
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Missing content field"))?;

    let title = match non_blank_text(req.title) {
        Some(title) => title,
        None => {
            let generated = fallback_title(&content);
            debug!(title = %generated, "Generated fallback title");
            generated
        }
    };

    let created = state
        .maps
        .create_map(user_id, new_map_fields(&title, content.clone(), Utc::now()))
        .await
        .map_err(|e| {
            error!("Map creation failed: {}", e);
            port_error_response(e)
        })?;

    match state.maps.get_map(user_id, created.id).await {
        Ok(saved) => debug!(
            map_id = %created.id,
            fields = ?saved.fields.keys().collect::<Vec<_>>(),
            "Verified stored fields"
        ),
        Err(e) => warn!(map_id = %created.id, "Could not re-read created map: {}", e),
    }

    info!(map_id = %created.id, %user_id, "Created new map");
    Ok((
        StatusCode::CREATED,
        Json(CreateMapResponse {
            id: created.id,
            title,
            content,
        }),
    ))
}

/// Replace a map's tree, naming the map in the body.
#[utoipa::path(
    post,
    path = "/update-map",
    request_body = UpdateMapByBodyRequest,
    responses(
        (status = 200, description = "Map updated", body = UpdateMapResponse),
        (status = 400, description = "Missing documentId or new tree", body = ErrorBody),
        (status = 404, description = "Map not found", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_map_by_body_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    ApiJson(req): ApiJson<UpdateMapByBodyRequest>,
) -> Result<Json<UpdateMapResponse>, HandlerError> {
    let document_id = non_blank_text(req.document_id)
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "Missing documentId"))?;

    let new_map = match req.new_map_data {
        Some(tree) => tree,
        None => req.new_map_content.unwrap_or(Value::Null),
    };
    if new_map.is_null() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing newMapData/newMapContent",
        ));
    }

    let map_id = parse_map_id(&document_id)?;
    state.maps.get_map(user_id, map_id).await.map_err(port_error_response)?;

    state
        .maps
        .update_map(user_id, map_id, map_update_fields(Some(new_map), None, Utc::now()))
        .await
        .map_err(|e| {
            error!("Map update failed for {}: {}", map_id, e);
            port_error_response(e)
        })?;

    info!(%map_id, %user_id, "Updated map tree");
    Ok(Json(UpdateMapResponse {
        id: document_id,
        updated: true,
    }))
}

/// Update a map's title and/or tree. Any non-empty body bumps `lastUpdated`.
#[utoipa::path(
    put,
    path = "/update-map/{map_id}",
    request_body = UpdateMapRequest,
    params(
        ("map_id" = String, Path, description = "The id of the map to update.")
    ),
    responses(
        (status = 200, description = "Map updated", body = UpdateMapResponse),
        (status = 400, description = "Empty body", body = ErrorBody),
        (status = 404, description = "Map not found", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_map_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(raw_map_id): Path<String>,
    ApiJson(req): ApiJson<UpdateMapRequest>,
) -> Result<Json<UpdateMapResponse>, HandlerError> {
    if req.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "No data to update"));
    }

    let map_id = parse_map_id(&raw_map_id)?;
    state.maps.get_map(user_id, map_id).await.map_err(port_error_response)?;

    state
        .maps
        .update_map(user_id, map_id, map_update_fields(req.content, req.title, Utc::now()))
        .await
        .map_err(|e| {
            error!("Map update failed for {}: {}", map_id, e);
            port_error_response(e)
        })?;

    info!(%map_id, %user_id, "Updated map");
    Ok(Json(UpdateMapResponse {
        id: raw_map_id,
        updated: true,
    }))
}

/// Backfill `name`, `mapData` and `content` on legacy map documents.
#[utoipa::path(
    post,
    path = "/migrate-maps",
    responses(
        (status = 200, description = "Migration summary", body = MigrationReportBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn migrate_maps_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<MigrationReportBody>, HandlerError> {
    info!(%user_id, "Migrating maps");
    let report = migrate_user_maps(state.maps.as_ref(), user_id)
        .await
        .map_err(|e| {
            error!("Map migration failed for {}: {}", user_id, e);
            port_error_response(e)
        })?;

    info!(
        migrated = report.migrated,
        skipped = report.skipped,
        errors = report.errors.len(),
        "Migration completed"
    );
    Ok(Json(report.into()))
}

/// Ids that are not UUIDs cannot name a stored map.
fn parse_map_id(raw: &str) -> Result<Uuid, HandlerError> {
    Uuid::parse_str(raw).map_err(|_| error_response(StatusCode::NOT_FOUND, "Map not found"))
}
