pub mod auth;
pub mod extract;
pub mod generation;
pub mod maps;
pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::require_auth;
use state::AppState;

/// Builds the API router: public auth routes plus the bearer-protected map routes.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route("/generate-map", post(generation::generate_map_handler))
        .route("/expand-node", post(generation::expand_node_handler))
        .route("/get-explanation", post(generation::explanation_handler))
        .route("/get-maps", get(maps::list_maps_handler))
        .route("/create-map", post(maps::create_map_handler))
        .route("/update-map", post(maps::update_map_by_body_handler))
        .route(
            "/update-map/{map_id}",
            put(maps::update_map_handler).patch(maps::update_map_handler),
        )
        .route("/migrate-maps", post(maps::migrate_maps_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
