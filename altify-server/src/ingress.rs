//! The atomic staging protocol (spec §4.1) and the approval gate (spec §4.1,
//! P7). Rollback is represented as a stack of compensations executed in
//! reverse order: adapter outcomes are plain result values, never exceptions,
//! so a failed stage can unwind the stages that already succeeded.

use altify_core::domain::{Status, Task, TaskMessage};
use altify_core::error::{AltifyError, Result};
use uuid::Uuid;

use crate::state::AppState;
use crate::validation::{validate_context, validate_image};

/// One undo step for a partially-staged upload.
enum Compensation {
    DeleteBlob(String),
    DeleteRow(String),
}

/// Upload one (image, context) pair through the four-step staging protocol
/// (spec §4.1 step 1-4), rolling back everything already written if any
/// later step fails.
pub async fn upload(state: &AppState, image_bytes: Vec<u8>, context: String) -> Result<Task> {
    validate_image(&image_bytes)?;
    let context = validate_context(&context)?;

    let id = Uuid::new_v4().to_string();
    let image_key = format!("tasks/{id}");
    let mut done: Vec<Compensation> = Vec::new();

    match stage(state, &id, &image_key, context, image_bytes, &mut done).await {
        Ok(task) => Ok(task),
        Err(e) => {
            if rollback(state, done).await {
                Err(e)
            } else {
                tracing::error!(task_id = %id, error = %e, "ingress rollback failed; orphans left for reconciler/gc");
                Err(AltifyError::Internal(format!(
                    "rollback failed after ingress failure for task {id}: {e}"
                )))
            }
        }
    }
}

async fn stage(
    state: &AppState,
    id: &str,
    image_key: &str,
    context: String,
    image_bytes: Vec<u8>,
    done: &mut Vec<Compensation>,
) -> Result<Task> {
    // Step 2: BS put-if-absent.
    state.bs.put(image_key, image_bytes).await?;
    done.push(Compensation::DeleteBlob(image_key.to_string()));

    // Step 3: RS insert, status=PENDING.
    let task = Task::new(id.to_string(), image_key.to_string(), context.clone());
    state.rs.insert(&task).await?;
    done.push(Compensation::DeleteRow(id.to_string()));

    // Step 4: publish with confirms. A failure here is the only leg that can
    // still roll back (I4 / spec §4.1: "a failure after BK confirm is not
    // possible in this order").
    let message = TaskMessage::new(id, image_key, context);
    state
        .bk
        .publish(altify_core::config::queues::MAIN, message.to_json(), None)
        .await?;

    Ok(task)
}

/// Undo compensations in reverse. Returns `true` if every compensation
/// succeeded.
async fn rollback(state: &AppState, done: Vec<Compensation>) -> bool {
    let mut all_ok = true;
    for step in done.into_iter().rev() {
        let ok = match step {
            Compensation::DeleteBlob(key) => state.bs.delete(&key).await.is_ok(),
            Compensation::DeleteRow(id) => state.rs.delete(&id).await.is_ok(),
        };
        all_ok &= ok;
    }
    all_ok
}

/// `BulkUpload`: sequential, partial-failure-tolerant (spec §4.1: "on item
/// *i* failure, prior successes are retained, the response reports
/// per-item outcomes").
pub async fn bulk_upload(state: &AppState, items: Vec<(Vec<u8>, String)>) -> Vec<Result<Task>> {
    let mut results = Vec::with_capacity(items.len());
    for (image_bytes, context) in items {
        results.push(upload(state, image_bytes, context).await);
    }
    results
}

/// `Approve`: requires `status=DONE` (spec §4.1, P7). Distinguishes a
/// missing task (`NotFound`) from one that exists but isn't settled yet
/// (`PreconditionFailed`).
pub async fn approve(state: &AppState, id: &str, selected_index: u8, final_alt: &str) -> Result<Task> {
    if !(1..=2).contains(&selected_index) {
        return Err(AltifyError::BadInput(format!(
            "selected_alt_index must be 1 or 2, got {selected_index}"
        )));
    }
    let final_alt = final_alt.trim();
    if final_alt.is_empty() {
        return Err(AltifyError::BadInput("final_alt must not be empty".to_string()));
    }

    let existing = state
        .rs
        .get(id)
        .await?
        .ok_or_else(|| AltifyError::NotFound(format!("task {id}")))?;
    if existing.status != Status::Done {
        return Err(AltifyError::PreconditionFailed(format!(
            "task {id} is {:?}, approval requires DONE",
            existing.status
        )));
    }

    let applied = state.rs.approve(id, selected_index, final_alt).await?;
    if !applied {
        return Err(AltifyError::Internal(format!(
            "approve lost the race on task {id}: it left DONE between read and write"
        )));
    }
    state
        .rs
        .get(id)
        .await?
        .ok_or_else(|| AltifyError::Internal(format!("task {id} vanished immediately after approval")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use altify_core::fakes::{FakeBlobStore, FakeBroker, FakeRelationalStore};
    use std::sync::Arc;

    fn harness() -> AppState {
        AppState::new(
            Arc::new(FakeRelationalStore::new()),
            Arc::new(FakeBlobStore::new()),
            Arc::new(FakeBroker::new()),
        )
    }

    const ONE_PX_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00,
        0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00,
        0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x64, 0x60, 0x60, 0x60, 0x00, 0x00, 0x00, 0x05, 0x00, 0x01,
        0x5A, 0x27, 0xDE, 0xFC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    // P1: all three legs land, or none do.
    #[tokio::test]
    async fn successful_upload_stages_all_three_legs() {
        let state = harness();
        let task = upload(&state, ONE_PX_PNG.to_vec(), "cat on mat".to_string()).await.unwrap();

        assert_eq!(state.rs.get(&task.id).await.unwrap().unwrap().status, Status::Pending);
        assert!(state.bs.exists(&task.image_key).await.unwrap());
        let depth = state.bk.queue_depth(altify_core::config::queues::MAIN).await.unwrap();
        assert_eq!(depth.ready, 1);
    }

    #[tokio::test]
    async fn bad_context_rolls_back_nothing_since_nothing_was_staged() {
        let state = harness();
        let err = upload(&state, ONE_PX_PNG.to_vec(), "   ".to_string()).await.unwrap_err();
        assert!(matches!(err, AltifyError::BadInput(_)));
        assert_eq!(state.bk.queue_depth(altify_core::config::queues::MAIN).await.unwrap().ready, 0);
    }

    // Scenario 2: bulk upload with one bad item in the middle.
    #[tokio::test]
    async fn bulk_upload_partial_failure_retains_good_items() {
        let state = harness();
        let items = vec![
            (ONE_PX_PNG.to_vec(), "first".to_string()),
            (ONE_PX_PNG.to_vec(), "   ".to_string()),
            (ONE_PX_PNG.to_vec(), "third".to_string()),
        ];
        let results = bulk_upload(&state, items).await;
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(AltifyError::BadInput(_))));
        assert!(results[2].is_ok());
        assert_eq!(state.bk.queue_depth(altify_core::config::queues::MAIN).await.unwrap().ready, 2);
    }

    #[tokio::test]
    async fn approve_requires_done_status() {
        let state = harness();
        let task = upload(&state, ONE_PX_PNG.to_vec(), "cat".to_string()).await.unwrap();
        let err = approve(&state, &task.id, 1, "A cat.").await.unwrap_err();
        assert!(matches!(err, AltifyError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn approve_missing_task_is_not_found() {
        let state = harness();
        let err = approve(&state, "no-such-id", 1, "A cat.").await.unwrap_err();
        assert!(matches!(err, AltifyError::NotFound(_)));
    }

    #[tokio::test]
    async fn approve_succeeds_once_done() {
        let state = harness();
        let task = upload(&state, ONE_PX_PNG.to_vec(), "cat".to_string()).await.unwrap();
        state.rs.claim_for_processing(&task.id).await.unwrap();
        state.rs.complete(&task.id, "A", "B").await.unwrap();

        let approved = approve(&state, &task.id, 1, "A cat.").await.unwrap();
        assert_eq!(approved.selected_index, Some(1));
        assert_eq!(approved.final_alt.as_deref(), Some("A cat."));
    }
}
