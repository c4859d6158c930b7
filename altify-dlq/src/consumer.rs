//! The DLQ re-drive loop (spec §4.3). Every message reaching `tasks.dlq`
//! already passed through a worker's `nack_dlq`, which only fires on
//! *transient* failures (§4.2 step 7) — deterministic and not-found
//! failures settle `FAILED` directly without ever touching the DLQ. So this
//! consumer's only job is enforcing the attempts budget, not re-classifying
//! the failure.

use std::sync::Arc;
use std::time::Duration;

use altify_core::config::queues;
use altify_core::domain::TaskMessage;
use altify_core::ports::{Broker, Delivery, RelationalStore};
use tokio_util::sync::CancellationToken;

use crate::settings::{backoff_delay_ms, DlqSettings};

pub struct DlqDeps {
    pub rs: Arc<dyn RelationalStore>,
    pub bk: Arc<dyn Broker>,
}

pub async fn run(deps: DlqDeps, settings: DlqSettings, cancel: CancellationToken) -> anyhow::Result<()> {
    let mut consumer = deps
        .bk
        .consume(queues::DLQ, 1)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open consumer on {}: {e}", queues::DLQ))?;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("dlq consumer received shutdown signal, exiting");
                return Ok(());
            }
            next = consumer.recv() => {
                match next {
                    None => {
                        tracing::info!("dlq broker consumer closed, exiting");
                        return Ok(());
                    }
                    Some(Err(e)) => tracing::warn!(error = %e, "dlq consume error, retrying"),
                    Some(Ok(delivery)) => handle_one(&deps, &settings, delivery).await,
                }
            }
        }
    }
}

async fn handle_one(deps: &DlqDeps, settings: &DlqSettings, delivery: Box<dyn Delivery>) {
    // Step 1: attempts from the x-death header (authoritative, spec §4.3).
    let attempts = delivery.delivery_count().max(1);

    let message = match TaskMessage::from_json(delivery.body()) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(error = %e, "malformed message on dlq, dropping (nothing recoverable to act on)");
            let _ = delivery.ack().await;
            return;
        }
    };

    if attempts < settings.max_attempts {
        redrive(deps, settings, &message, attempts, delivery).await;
    } else {
        let reason = format!("exceeded max_attempts={} after {attempts} delivery attempt(s)", settings.max_attempts);
        match deps.rs.fail_from_dlq(&message.id, &reason).await {
            Ok(_) => tracing::info!(task_id = %message.id, attempts, "dlq budget exhausted, task FAILED"),
            Err(e) => tracing::warn!(task_id = %message.id, error = %e, "rs unavailable settling FAILED"),
        }
        let _ = delivery.ack().await;
    }
}

async fn redrive(deps: &DlqDeps, settings: &DlqSettings, message: &TaskMessage, attempts: u32, delivery: Box<dyn Delivery>) {
    // Step 2: Processing -> Pending, the one permitted non-monotone
    // transition (I6). Idempotent: a duplicate DLQ delivery for an
    // already-Pending or already-terminal row just sees `false` here and we
    // still attempt the republish, since the worker's claim guard will
    // dedupe on the receiving end (P2).
    if let Err(e) = deps.rs.reset_to_pending(&message.id).await {
        tracing::warn!(task_id = %message.id, error = %e, "rs unavailable resetting to pending, requeueing dlq delivery");
        let _ = delivery.nack_dlq().await;
        return;
    }

    let delay = Duration::from_millis(backoff_delay_ms(settings, attempts));
    match deps.bk.publish(queues::MAIN, message.to_json(), Some(delay)).await {
        Ok(()) => {
            tracing::info!(task_id = %message.id, attempts, delay_ms = delay.as_millis() as u64, "dlq redrove task");
            let _ = delivery.ack().await;
        }
        Err(e) => {
            tracing::warn!(task_id = %message.id, error = %e, "broker unavailable republishing, requeueing dlq delivery");
            let _ = delivery.nack_dlq().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use altify_core::domain::{Status, Task};
    use altify_core::fakes::{FakeBroker, FakeRelationalStore};

    async fn seed(rs: &FakeRelationalStore, bk: &FakeBroker, id: &str, delivery_count: u32) {
        let mut task = Task::new(id.to_string(), format!("tasks/{id}"), "ctx".to_string());
        task.status = Status::Processing;
        task.attempts = delivery_count;
        rs.insert(&task).await.unwrap();

        let message = TaskMessage::new(id, &task.image_key, &task.context_text);
        // Simulate `delivery_count` prior redeliveries by nack_requeue-ing
        // on the main queue before landing it straight on the dlq.
        bk.publish(queues::DLQ, message.to_json(), None).await.unwrap();
        for _ in 1..delivery_count {
            let mut consumer = bk.consume(queues::DLQ, 1).await.unwrap();
            let d = consumer.recv().await.unwrap().unwrap();
            d.nack_requeue().await.unwrap();
        }
    }

    // Scenario 4: OOM twice then succeed, max_attempts=3 -> two redrives.
    #[tokio::test]
    async fn under_budget_redrives_with_backoff() {
        let rs = Arc::new(FakeRelationalStore::new());
        let bk = Arc::new(FakeBroker::new());
        seed(&rs, &bk, "t1", 1).await;

        let deps = DlqDeps { rs: rs.clone(), bk: bk.clone() };
        let settings = DlqSettings { max_attempts: 3, backoff_base_ms: 10, backoff_cap_ms: 1_000 };

        let mut consumer = bk.consume(queues::DLQ, 1).await.unwrap();
        let delivery = consumer.recv().await.unwrap().unwrap();
        handle_one(&deps, &settings, delivery).await;

        let row = rs.get("t1").await.unwrap().unwrap();
        assert_eq!(row.status, Status::Pending);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(bk.queue_depth(queues::MAIN).await.unwrap().ready, 1);
    }

    #[tokio::test]
    async fn budget_exhausted_settles_failed() {
        let rs = Arc::new(FakeRelationalStore::new());
        let bk = Arc::new(FakeBroker::new());
        seed(&rs, &bk, "t2", 3).await;

        let deps = DlqDeps { rs: rs.clone(), bk: bk.clone() };
        let settings = DlqSettings { max_attempts: 3, backoff_base_ms: 10, backoff_cap_ms: 1_000 };

        let mut consumer = bk.consume(queues::DLQ, 1).await.unwrap();
        let delivery = consumer.recv().await.unwrap().unwrap();
        handle_one(&deps, &settings, delivery).await;

        let row = rs.get("t2").await.unwrap().unwrap();
        assert_eq!(row.status, Status::Failed);
        assert!(row.last_error.is_some());
        assert_eq!(bk.queue_depth(queues::MAIN).await.unwrap().ready, 0);
    }
}
