//! Axum handlers for the ingress HTTP surface (spec §6).

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use altify_core::error::AltifyError;

use crate::dto::{
    ApproveRequest, BulkItemResult, BulkUploadResponse, ErrorBody, FinalizeItem, FinalizeItemResult,
    FinalizeResponse, HealthResponse, TaskView, UploadResponse,
};
use crate::ingress;
use crate::state::AppState;

fn error_response(err: AltifyError) -> Response {
    let status = match &err {
        AltifyError::BadInput(_) => StatusCode::BAD_REQUEST,
        AltifyError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        AltifyError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
        AltifyError::NotFound(_) => StatusCode::NOT_FOUND,
        AltifyError::TransientInference(_) | AltifyError::DeterministicInference(_) | AltifyError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorBody { error: err.to_string() })).into_response()
}

async fn read_upload_fields(multipart: &mut Multipart) -> (Option<Vec<u8>>, Option<String>) {
    let mut image = None;
    let mut context = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name() {
            Some("image") => {
                if let Ok(bytes) = field.bytes().await {
                    image = Some(bytes.to_vec());
                }
            }
            Some("context") => {
                if let Ok(text) = field.text().await {
                    context = Some(text);
                }
            }
            _ => {}
        }
    }
    (image, context)
}

/// `POST /tasks/upload`.
#[utoipa::path(
    post,
    path = "/tasks/upload",
    responses((status = 200, description = "Task accepted", body = UploadResponse)),
    tag = "Tasks"
)]
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let (image, context) = read_upload_fields(&mut multipart).await;
    let (Some(image), Some(context)) = (image, context) else {
        return error_response(AltifyError::BadInput(
            "multipart form must include an `image` field and a `context` field".to_string(),
        ));
    };

    match ingress::upload(&state, image, context).await {
        Ok(task) => (StatusCode::OK, Json(UploadResponse::from(&task))).into_response(),
        Err(e) => error_response(e),
    }
}

/// `POST /tasks/bulk-upload`. Repeated `images`/`contexts` multipart fields,
/// index-aligned (spec §6).
#[utoipa::path(
    post,
    path = "/tasks/bulk-upload",
    responses((status = 200, description = "Per-item outcomes", body = BulkUploadResponse)),
    tag = "Tasks"
)]
pub async fn bulk_upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut images = Vec::new();
    let mut contexts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name() {
            Some("images") => {
                if let Ok(bytes) = field.bytes().await {
                    images.push(bytes.to_vec());
                }
            }
            Some("contexts") => {
                if let Ok(text) = field.text().await {
                    contexts.push(text);
                }
            }
            _ => {}
        }
    }

    if images.len() != contexts.len() {
        return error_response(AltifyError::BadInput(format!(
            "bulk upload received {} image field(s) but {} context field(s); they must be index-aligned",
            images.len(),
            contexts.len()
        )));
    }

    let items: Vec<(Vec<u8>, String)> = images.into_iter().zip(contexts).collect();
    let results = ingress::bulk_upload(&state, items).await;
    let tasks = results
        .into_iter()
        .map(|r| match r {
            Ok(task) => BulkItemResult::Accepted { id: task.id, status: task.status.as_str().to_string() },
            Err(e) => BulkItemResult::Rejected { error: e.to_string() },
        })
        .collect();

    (StatusCode::OK, Json(BulkUploadResponse { tasks })).into_response()
}

/// `GET /tasks/{id}`.
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    responses(
        (status = 200, description = "Task view", body = TaskView),
        (status = 404, description = "No such task")
    ),
    tag = "Tasks"
)]
pub async fn get_task(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.rs.get(&id).await {
        Ok(Some(task)) => (StatusCode::OK, Json(TaskView::from(task))).into_response(),
        Ok(None) => error_response(AltifyError::NotFound(format!("task {id}"))),
        Err(e) => error_response(e),
    }
}

/// `PATCH /tasks/{id}/approve`.
#[utoipa::path(
    patch,
    path = "/tasks/{id}/approve",
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Approval recorded", body = TaskView),
        (status = 412, description = "Task is not DONE yet")
    ),
    tag = "Tasks"
)]
pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ApproveRequest>,
) -> Response {
    if !body.is_approved {
        return error_response(AltifyError::BadInput(
            "is_approved=false has no defined effect; this endpoint only records approvals".to_string(),
        ));
    }
    match ingress::approve(&state, &id, body.selected_alt_index, &body.final_alt).await {
        Ok(task) => (StatusCode::OK, Json(TaskView::from(task))).into_response(),
        Err(e) => error_response(e),
    }
}

/// `POST /tasks/finalize`: batched approval (spec §6).
#[utoipa::path(
    post,
    path = "/tasks/finalize",
    request_body = Vec<FinalizeItem>,
    responses((status = 200, description = "Per-item outcomes", body = FinalizeResponse)),
    tag = "Tasks"
)]
pub async fn finalize(State(state): State<AppState>, Json(items): Json<Vec<FinalizeItem>>) -> Response {
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let outcome = ingress::approve(&state, &item.task_id, item.selected_alt_index, &item.final_alt).await;
        results.push(match outcome {
            Ok(task) => FinalizeItemResult::Approved { task_id: task.id, status: task.status.as_str().to_string() },
            Err(e) => FinalizeItemResult::Rejected { task_id: item.task_id, error: e.to_string() },
        });
    }
    (StatusCode::OK, Json(FinalizeResponse { results })).into_response()
}

/// `GET /health`.
#[utoipa::path(get, path = "/health", responses((status = 200, body = HealthResponse)), tag = "Health")]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
