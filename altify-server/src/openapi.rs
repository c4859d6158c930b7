//! OpenAPI spec generation and serving, matching
//! `foiacquire-server::handlers::openapi`'s use of `utoipa`.

use axum::Json;
use utoipa::OpenApi;

use crate::dto;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(title = "Altify Ingress API", description = "Asynchronous alt-text job pipeline ingress", version = "0.1.0"),
    paths(
        handlers::health,
        handlers::upload,
        handlers::bulk_upload,
        handlers::finalize,
        handlers::get_task,
        handlers::approve,
    ),
    components(schemas(
        dto::UploadResponse,
        dto::BulkItemResult,
        dto::BulkUploadResponse,
        dto::TaskView,
        dto::ApproveRequest,
        dto::FinalizeItem,
        dto::FinalizeItemResult,
        dto::FinalizeResponse,
        dto::ErrorBody,
        dto::HealthResponse,
    )),
    tags(
        (name = "Tasks", description = "Task ingestion, lookup, and approval"),
        (name = "Health", description = "Liveness probe"),
    )
)]
struct ApiDoc;

pub async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
