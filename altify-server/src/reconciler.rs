//! Background reconciler sweep (spec §4.1, §9): republishes messages for
//! `PENDING` rows whose staging crashed between the RS insert (step 3) and
//! the broker publish (step 4). Workers deduplicate the resulting
//! redelivery via the claim guard's status predicate, so re-publishing an
//! already-dispatched row is harmless.

use std::sync::Arc;
use std::time::Duration;

use altify_core::domain::TaskMessage;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub async fn run(state: Arc<AppState>, interval: Duration, grace: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("reconciler shutting down");
                return;
            }
            _ = ticker.tick() => sweep_once(&state, grace).await,
        }
    }
}

pub(crate) async fn sweep_once(state: &AppState, grace: Duration) {
    let grace = chrono::Duration::from_std(grace).unwrap_or(chrono::Duration::seconds(30));
    let cutoff = Utc::now() - grace;

    let orphans = match state.rs.list_pending_before(cutoff).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "reconciler sweep: failed to list PENDING rows");
            return;
        }
    };

    for task in orphans {
        let message = TaskMessage::new(task.id.clone(), task.image_key.clone(), task.context_text.clone());
        match state
            .bk
            .publish(altify_core::config::queues::MAIN, message.to_json(), None)
            .await
        {
            Ok(()) => tracing::info!(task_id = %task.id, "reconciler republished orphaned PENDING task"),
            Err(e) => tracing::warn!(task_id = %task.id, error = %e, "reconciler republish failed, will retry next sweep"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use altify_core::domain::{Status, Task};
    use altify_core::fakes::{FakeBlobStore, FakeBroker, FakeRelationalStore};

    #[tokio::test]
    async fn republishes_stale_pending_rows_with_no_message() {
        let state = Arc::new(AppState::new(
            Arc::new(FakeRelationalStore::new()),
            Arc::new(FakeBlobStore::new()),
            Arc::new(FakeBroker::new()),
        ));

        let mut stale = Task::new("t1".into(), "tasks/t1".into(), "ctx".into());
        stale.updated_at = Utc::now() - chrono::Duration::seconds(120);
        state.rs.insert(&stale).await.unwrap();

        let mut fresh = Task::new("t2".into(), "tasks/t2".into(), "ctx".into());
        fresh.status = Status::Pending;
        state.rs.insert(&fresh).await.unwrap();

        sweep_once(&state, Duration::from_secs(30)).await;

        let depth = state.bk.queue_depth(altify_core::config::queues::MAIN).await.unwrap();
        assert_eq!(depth.ready, 1, "only the stale row should be republished");
    }
}
