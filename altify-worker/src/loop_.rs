//! The worker message loop (spec §4.2, §5): one slot, prefetch 1, at most
//! one in-flight inference at a time.

use std::sync::Arc;

use altify_core::domain::TaskMessage;
use altify_core::error::AltifyError;
use altify_core::ports::{BlobStore, Broker, Delivery, Inferencer, InferencerFailure, RelationalStore};
use tokio_util::sync::CancellationToken;

use crate::settings::WorkerSettings;

/// The dependencies one worker slot needs. Held behind `Arc` so
/// `altify-cli` can construct them once and hand the same handles to every
/// process's single slot.
pub struct WorkerDeps {
    pub rs: Arc<dyn RelationalStore>,
    pub bs: Arc<dyn BlobStore>,
    pub bk: Arc<dyn Broker>,
    pub inferencer: Arc<dyn Inferencer>,
}

/// Run the message loop until `cancel` fires or the broker consumer closes.
///
/// Cancellation is observed only at the suspension point waiting for the
/// next delivery (spec §5: "cancellation must be honored between steps but
/// never interrupt an in-flight inference mid-call"); once a delivery is in
/// hand, `handle_one` runs it to completion regardless of `cancel`.
pub async fn run(deps: WorkerDeps, settings: WorkerSettings, queue: &str, cancel: CancellationToken) -> anyhow::Result<()> {
    let mut consumer = deps
        .bk
        .consume(queue, 1)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open consumer on {queue}: {e}"))?;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("worker received shutdown signal between messages, exiting");
                return Ok(());
            }
            next = consumer.recv() => {
                match next {
                    None => {
                        tracing::info!("broker consumer closed, exiting worker loop");
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "consume error, retrying");
                    }
                    Some(Ok(delivery)) => handle_one(&deps, &settings, delivery).await,
                }
            }
        }
    }
}

async fn handle_one(deps: &WorkerDeps, settings: &WorkerSettings, delivery: Box<dyn Delivery>) {
    let delivery_count = delivery.delivery_count();

    let message = match TaskMessage::from_json(delivery.body()) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(error = %e, delivery_count, "malformed task message, routing to DLQ");
            let _ = delivery.nack_dlq().await;
            return;
        }
    };

    // Step 3: the optimistic claim guard (spec §4.2 step 3, P2).
    let task = match deps.rs.claim_for_processing(&message.id).await {
        Ok(Some(task)) => task,
        Ok(None) => {
            tracing::debug!(task_id = %message.id, "task already terminal; acking duplicate delivery (P2 dedup)");
            let _ = delivery.ack().await;
            return;
        }
        Err(e) => {
            tracing::warn!(task_id = %message.id, error = %e, "RS unavailable during claim guard, routing to DLQ");
            let _ = delivery.nack_dlq().await;
            return;
        }
    };

    // Step 4: fetch image bytes.
    let image_bytes = match deps.bs.get(&message.image_key).await {
        Ok(bytes) => bytes,
        Err(AltifyError::NotFound(_)) => {
            tracing::warn!(task_id = %task.id, "blob missing, terminal data error");
            let _ = deps.rs.fail_deterministic(&task.id, "image blob not found in BS").await;
            let _ = delivery.ack().await;
            return;
        }
        Err(e) => {
            tracing::warn!(task_id = %task.id, error = %e, "BS unavailable, routing to DLQ");
            let _ = delivery.nack_dlq().await;
            return;
        }
    };

    // Step 5: generate two candidates, bounded by T_inf (spec §5).
    let generated = tokio::time::timeout(
        settings.infer_timeout(),
        deps.inferencer.generate(&image_bytes, &message.context, 2),
    )
    .await;

    match generated {
        Err(_elapsed) => {
            tracing::warn!(task_id = %task.id, "inference exceeded T_inf, treated as transient, routing to DLQ");
            let _ = delivery.nack_dlq().await;
        }
        Ok(Err(InferencerFailure::Oom | InferencerFailure::Timeout | InferencerFailure::Internal(_))) => {
            tracing::warn!(task_id = %task.id, "transient inference failure, routing to DLQ");
            let _ = delivery.nack_dlq().await;
        }
        Ok(Err(InferencerFailure::DecodeError(reason))) => {
            tracing::warn!(task_id = %task.id, %reason, "deterministic inference failure");
            let _ = deps.rs.fail_deterministic(&task.id, &format!("decode error: {reason}")).await;
            let _ = delivery.ack().await;
        }
        Ok(Ok(candidates)) if is_valid_pair(&candidates) => {
            // Step 6: single RS update writing both candidates and Done.
            match deps.rs.complete(&task.id, &candidates[0], &candidates[1]).await {
                Ok(true) => {
                    tracing::info!(task_id = %task.id, "task completed");
                    let _ = delivery.ack().await;
                }
                Ok(false) => {
                    // Another delivery of the same message already won (P2).
                    tracing::debug!(task_id = %task.id, "complete() lost the race to a duplicate delivery");
                    let _ = delivery.ack().await;
                }
                Err(e) => {
                    tracing::warn!(task_id = %task.id, error = %e, "RS unavailable while completing, routing to DLQ");
                    let _ = delivery.nack_dlq().await;
                }
            }
        }
        Ok(Ok(candidates)) => {
            tracing::warn!(
                task_id = %task.id,
                count = candidates.len(),
                "inferencer returned an empty or wrong-arity result, deterministic failure"
            );
            let _ = deps
                .rs
                .fail_deterministic(&task.id, "inferencer returned empty or malformed candidates")
                .await;
            let _ = delivery.ack().await;
        }
    }
}

/// P4: exactly two non-empty candidates.
fn is_valid_pair(candidates: &[String]) -> bool {
    candidates.len() == 2 && candidates.iter().all(|c| !c.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use altify_core::domain::{Status, Task, TaskMessage};
    use altify_core::fakes::{FakeBlobStore, FakeBroker, FakeRelationalStore, Outcome, ScriptedInferencer};
    use std::time::Duration;

    fn deps(
        rs: Arc<FakeRelationalStore>,
        bs: Arc<FakeBlobStore>,
        bk: Arc<FakeBroker>,
        inferencer: Arc<ScriptedInferencer>,
    ) -> WorkerDeps {
        WorkerDeps { rs, bs, bk, inferencer }
    }

    async fn seed_pending(rs: &FakeRelationalStore, bs: &FakeBlobStore, bk: &FakeBroker, id: &str) {
        let task = Task::new(id.to_string(), format!("tasks/{id}"), "a cat on a mat".to_string());
        rs.insert(&task).await.unwrap();
        bs.put(&task.image_key, b"png-bytes".to_vec()).await.unwrap();
        let message = TaskMessage::new(id, &task.image_key, &task.context_text);
        bk.publish(altify_core::config::queues::MAIN, message.to_json(), None).await.unwrap();
    }

    #[tokio::test]
    async fn happy_path_completes_task_with_both_candidates() {
        let rs = Arc::new(FakeRelationalStore::new());
        let bs = Arc::new(FakeBlobStore::new());
        let bk = Arc::new(FakeBroker::new());
        seed_pending(&rs, &bs, &bk, "t1").await;

        let inferencer = Arc::new(ScriptedInferencer::always("A", "B"));
        let deps = deps(rs.clone(), bs.clone(), bk.clone(), inferencer);

        let mut consumer = bk.consume(altify_core::config::queues::MAIN, 1).await.unwrap();
        let delivery = consumer.recv().await.unwrap().unwrap();
        handle_one(&deps, &WorkerSettings::default(), delivery).await;

        let row = rs.get("t1").await.unwrap().unwrap();
        assert_eq!(row.status, Status::Done);
        assert_eq!(row.alt1.as_deref(), Some("A"));
        assert_eq!(row.alt2.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn missing_blob_is_terminal_failed() {
        let rs = Arc::new(FakeRelationalStore::new());
        let bs = Arc::new(FakeBlobStore::new());
        let bk = Arc::new(FakeBroker::new());
        let task = Task::new("t2".to_string(), "tasks/t2".to_string(), "ctx".to_string());
        rs.insert(&task).await.unwrap();
        let message = TaskMessage::new("t2", "tasks/t2", "ctx");
        bk.publish(altify_core::config::queues::MAIN, message.to_json(), None).await.unwrap();

        let inferencer = Arc::new(ScriptedInferencer::always("A", "B"));
        let deps = deps(rs.clone(), bs, bk.clone(), inferencer);

        let mut consumer = bk.consume(altify_core::config::queues::MAIN, 1).await.unwrap();
        let delivery = consumer.recv().await.unwrap().unwrap();
        handle_one(&deps, &WorkerSettings::default(), delivery).await;

        let row = rs.get("t2").await.unwrap().unwrap();
        assert_eq!(row.status, Status::Failed);
        assert!(row.last_error.is_some());
    }

    #[tokio::test]
    async fn decode_error_is_terminal_failed_with_single_attempt() {
        let rs = Arc::new(FakeRelationalStore::new());
        let bs = Arc::new(FakeBlobStore::new());
        let bk = Arc::new(FakeBroker::new());
        seed_pending(&rs, &bs, &bk, "t3").await;

        let inferencer = Arc::new(ScriptedInferencer::new(vec![Outcome::Fail(InferencerFailure::DecodeError(
            "bad header".to_string(),
        ))]));
        let deps = deps(rs.clone(), bs, bk.clone(), inferencer);

        let mut consumer = bk.consume(altify_core::config::queues::MAIN, 1).await.unwrap();
        let delivery = consumer.recv().await.unwrap().unwrap();
        handle_one(&deps, &WorkerSettings::default(), delivery).await;

        let row = rs.get("t3").await.unwrap().unwrap();
        assert_eq!(row.status, Status::Failed);
        assert_eq!(row.attempts, 1);
    }

    #[tokio::test]
    async fn transient_oom_nacks_to_dlq_without_mutating_status() {
        let rs = Arc::new(FakeRelationalStore::new());
        let bs = Arc::new(FakeBlobStore::new());
        let bk = Arc::new(FakeBroker::with_dlx([(
            altify_core::config::queues::MAIN.to_string(),
            altify_core::config::queues::DLQ.to_string(),
        )]));
        seed_pending(&rs, &bs, &bk, "t4").await;

        let inferencer = Arc::new(ScriptedInferencer::new(vec![Outcome::Fail(InferencerFailure::Oom)]));
        let deps = deps(rs.clone(), bs, bk.clone(), inferencer);

        let mut consumer = bk.consume(altify_core::config::queues::MAIN, 1).await.unwrap();
        let delivery = consumer.recv().await.unwrap().unwrap();
        handle_one(&deps, &WorkerSettings::default(), delivery).await;

        let row = rs.get("t4").await.unwrap().unwrap();
        assert_eq!(row.status, Status::Processing, "transient failure must not mutate status");
        assert_eq!(bk.queue_depth(altify_core::config::queues::DLQ).await.unwrap().ready, 1);
    }

    #[tokio::test]
    async fn duplicate_delivery_settles_exactly_once() {
        let rs = Arc::new(FakeRelationalStore::new());
        let bs = Arc::new(FakeBlobStore::new());
        let bk = Arc::new(FakeBroker::new());
        seed_pending(&rs, &bs, &bk, "t5").await;
        // Simulate a duplicate delivery already in the queue.
        let task = rs.get("t5").await.unwrap().unwrap();
        let message = TaskMessage::new("t5", &task.image_key, &task.context_text);
        bk.publish(altify_core::config::queues::MAIN, message.to_json(), None).await.unwrap();

        let inferencer = Arc::new(ScriptedInferencer::always("A", "B"));
        let deps = deps(rs.clone(), bs, bk.clone(), inferencer);

        let mut consumer = bk.consume(altify_core::config::queues::MAIN, 1).await.unwrap();
        let first = consumer.recv().await.unwrap().unwrap();
        handle_one(&deps, &WorkerSettings::default(), first).await;
        let second = consumer.recv().await.unwrap().unwrap();
        handle_one(&deps, &WorkerSettings::default(), second).await;

        let row = rs.get("t5").await.unwrap().unwrap();
        assert_eq!(row.status, Status::Done);
        assert!(row.attempts >= 1);
    }

    #[tokio::test]
    async fn shutdown_is_observed_between_messages_not_mid_delivery() {
        let rs = Arc::new(FakeRelationalStore::new());
        let bs = Arc::new(FakeBlobStore::new());
        let bk = Arc::new(FakeBroker::new());
        let inferencer = Arc::new(ScriptedInferencer::always("A", "B"));
        let worker_deps = deps(rs, bs, bk.clone(), inferencer);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = tokio::time::timeout(
            Duration::from_millis(500),
            run(worker_deps, WorkerSettings::default(), altify_core::config::queues::MAIN, cancel),
        )
        .await;
        assert!(result.is_ok(), "run() must exit promptly once cancel fires with no pending message");
    }
}
