//! Wire DTOs for the ingress HTTP surface (spec §6). Explicit typed records
//! rather than dynamic JSON.

use altify_core::domain::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `POST /tasks/upload` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub id: String,
    pub status: String,
}

impl From<&Task> for UploadResponse {
    fn from(task: &Task) -> Self {
        Self { id: task.id.clone(), status: task.status.as_str().to_string() }
    }
}

/// One entry of a `POST /tasks/bulk-upload` response: either the accepted
/// task's id/status, or the validation error that rejected it (spec §4.1
/// scenario 2: "the response reports per-item outcomes").
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum BulkItemResult {
    Accepted { id: String, status: String },
    Rejected { error: String },
}

/// `POST /tasks/bulk-upload` response.
///
/// This deployment picks the `{ "tasks": [...] }` wrapped form over a bare
/// array (documented in `DESIGN.md`).
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkUploadResponse {
    pub tasks: Vec<BulkItemResult>,
}

/// `GET /tasks/{id}` response: the full task view (spec §6).
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskView {
    pub id: String,
    pub image_key: String,
    pub context_text: String,
    pub status: String,
    pub alt1: Option<String>,
    pub alt2: Option<String>,
    pub selected_index: Option<u8>,
    pub final_alt: Option<String>,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            image_key: task.image_key,
            context_text: task.context_text,
            status: task.status.as_str().to_string(),
            alt1: task.alt1,
            alt2: task.alt2,
            selected_index: task.selected_index,
            final_alt: task.final_alt,
            attempts: task.attempts,
            created_at: task.created_at,
            updated_at: task.updated_at,
            last_error: task.last_error,
        }
    }
}

/// `PATCH /tasks/{id}/approve` request body (spec §6).
///
/// `is_approved` is part of the literal spec body but the spec defines no
/// reject operation; this implementation requires it to be `true` and
/// rejects `false` as `BadInput` (documented Open Question resolution in
/// `DESIGN.md`).
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveRequest {
    pub final_alt: String,
    pub is_approved: bool,
    pub selected_alt_index: u8,
}

/// One entry of the `POST /tasks/finalize` batched-approval request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FinalizeItem {
    pub task_id: String,
    pub selected_alt_index: u8,
    pub final_alt: String,
}

/// One entry of the `POST /tasks/finalize` response: mirrors
/// `BulkItemResult`'s accepted/rejected split.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum FinalizeItemResult {
    Approved { task_id: String, status: String },
    Rejected { task_id: String, error: String },
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FinalizeResponse {
    pub results: Vec<FinalizeItemResult>,
}

/// Error body returned for every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}
