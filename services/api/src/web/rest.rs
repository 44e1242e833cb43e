//! services/api/src/web/rest.rs
//!
//! Contains the master definition for the OpenAPI specification and the error
//! payload shared by every REST handler.

use axum::{http::StatusCode, response::Json};
use mind_mapper_core::ports::PortError;
use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::web::{auth, generation, maps};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generation::generate_map_handler,
        generation::expand_node_handler,
        generation::explanation_handler,
        maps::list_maps_handler,
        maps::create_map_handler,
        maps::update_map_by_body_handler,
        maps::update_map_handler,
        maps::migrate_maps_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
    ),
    components(
        schemas(
            ErrorBody,
            generation::GenerateMapRequest,
            generation::ExpandNodeRequest,
            generation::ExpandedNode,
            generation::ExplanationRequest,
            generation::ExplanationResponse,
            maps::CreateMapRequest,
            maps::CreateMapResponse,
            maps::UpdateMapByBodyRequest,
            maps::UpdateMapRequest,
            maps::UpdateMapResponse,
            maps::MigrationReportBody,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Mind Mapper API", description = "Generates, stores and migrates per-user mind maps.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by the protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

//=========================================================================================
// Error Payload
//=========================================================================================

/// The body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// The error half of every handler's result.
pub type HandlerError = (StatusCode, Json<ErrorBody>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// Maps a store failure onto a response, keeping NotFound distinguishable.
pub fn port_error_response(e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "Map not found"),
        PortError::Conflict(message) => error_response(StatusCode::CONFLICT, message),
        PortError::Unauthorized => error_response(StatusCode::FORBIDDEN, "Unauthorized"),
        PortError::Unexpected(message) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}
