//! Garbage-collector sweep (spec §7): "reconciler deletes RS rows older than
//! `T_gc` that have no matching BS object". Cleans up rows orphaned by a
//! failed ingress rollback (the `Internal` error path in `ingress::upload`).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub async fn run(state: Arc<AppState>, interval: Duration, window: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("gc sweep shutting down");
                return;
            }
            _ = ticker.tick() => sweep_once(&state, window).await,
        }
    }
}

pub(crate) async fn sweep_once(state: &AppState, window: Duration) {
    let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::hours(24));
    let cutoff = Utc::now() - window;

    let candidates = match state.rs.list_gc_candidates(cutoff).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "gc sweep: failed to list candidate rows");
            return;
        }
    };

    for task in candidates {
        match state.bs.exists(&task.image_key).await {
            Ok(true) => {} // not an orphan
            Ok(false) => match state.rs.delete(&task.id).await {
                Ok(()) => tracing::info!(task_id = %task.id, "gc deleted orphaned row with no backing blob"),
                Err(e) => tracing::warn!(task_id = %task.id, error = %e, "gc: failed to delete orphaned row"),
            },
            Err(e) => tracing::warn!(task_id = %task.id, error = %e, "gc: failed to check blob existence"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use altify_core::domain::Task;
    use altify_core::fakes::{FakeBlobStore, FakeBroker, FakeRelationalStore};

    #[tokio::test]
    async fn deletes_old_rows_with_no_backing_blob() {
        let state = Arc::new(AppState::new(
            Arc::new(FakeRelationalStore::new()),
            Arc::new(FakeBlobStore::new()),
            Arc::new(FakeBroker::new()),
        ));

        let mut orphan = Task::new("orphan".into(), "tasks/orphan".into(), "ctx".into());
        orphan.created_at = Utc::now() - chrono::Duration::hours(48);
        state.rs.insert(&orphan).await.unwrap();

        let mut healthy = Task::new("healthy".into(), "tasks/healthy".into(), "ctx".into());
        healthy.created_at = Utc::now() - chrono::Duration::hours(48);
        state.rs.insert(&healthy).await.unwrap();
        state.bs.put(&healthy.image_key, b"bytes".to_vec()).await.unwrap();

        sweep_once(&state, Duration::from_secs(3600)).await;

        assert!(state.rs.get("orphan").await.unwrap().is_none());
        assert!(state.rs.get("healthy").await.unwrap().is_some());
    }
}
