//! Router configuration, mirroring `foia-server::routes::create_router`.

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/tasks/upload", post(handlers::upload))
        .route("/tasks/bulk-upload", post(handlers::bulk_upload))
        .route("/tasks/finalize", post(handlers::finalize))
        .route("/tasks/:id", get(handlers::get_task))
        .route("/tasks/:id/approve", patch(handlers::approve))
        .route("/api/openapi.json", get(crate::openapi::serve_openapi))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
