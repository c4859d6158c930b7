use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Status, Task};
use crate::error::Result;
use crate::ports::RelationalStore;

/// In-memory [`RelationalStore`] backed by a `HashMap` guarded by a plain
/// `Mutex`. The conditional-update methods hold the lock for the whole
/// read-modify-write, which is exactly the serialization point a real
/// `UPDATE ... WHERE status IN (...)` gives you against concurrent workers.
#[derive(Default)]
pub struct FakeRelationalStore {
    rows: Mutex<HashMap<String, Task>>,
}

impl FakeRelationalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: snapshot a row without going through the port.
    pub fn peek(&self, id: &str) -> Option<Task> {
        self.rows.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl RelationalStore for FakeRelationalStore {
    async fn insert(&self, task: &Task) -> Result<()> {
        self.rows.lock().unwrap().insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.rows.lock().unwrap().remove(id);
        Ok(())
    }

    async fn claim_for_processing(&self, id: &str) -> Result<Option<Task>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(task) = rows.get_mut(id) else {
            return Ok(None);
        };
        if !Status::claimable().contains(&task.status) {
            return Ok(None);
        }
        task.status = Status::Processing;
        task.attempts += 1;
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn complete(&self, id: &str, alt1: &str, alt2: &str) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let Some(task) = rows.get_mut(id) else {
            return Ok(false);
        };
        if task.status != Status::Processing {
            return Ok(false);
        }
        task.alt1 = Some(alt1.to_string());
        task.alt2 = Some(alt2.to_string());
        task.status = Status::Done;
        task.last_error = None;
        task.updated_at = Utc::now();
        Ok(true)
    }

    async fn fail_deterministic(&self, id: &str, reason: &str) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let Some(task) = rows.get_mut(id) else {
            return Ok(false);
        };
        if task.status.is_terminal() {
            return Ok(false);
        }
        task.status = Status::Failed;
        task.last_error = Some(reason.to_string());
        task.updated_at = Utc::now();
        Ok(true)
    }

    async fn reset_to_pending(&self, id: &str) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let Some(task) = rows.get_mut(id) else {
            return Ok(false);
        };
        if task.status != Status::Processing {
            return Ok(false);
        }
        task.status = Status::Pending;
        task.updated_at = Utc::now();
        Ok(true)
    }

    async fn fail_from_dlq(&self, id: &str, reason: &str) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let Some(task) = rows.get_mut(id) else {
            return Ok(false);
        };
        if task.status.is_terminal() {
            return Ok(false);
        }
        task.status = Status::Failed;
        task.last_error = Some(reason.to_string());
        task.updated_at = Utc::now();
        Ok(true)
    }

    async fn approve(&self, id: &str, selected_index: u8, final_alt: &str) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let Some(task) = rows.get_mut(id) else {
            return Ok(false);
        };
        if task.status != Status::Done {
            return Ok(false);
        }
        task.selected_index = Some(selected_index);
        task.final_alt = Some(final_alt.to_string());
        task.updated_at = Utc::now();
        Ok(true)
    }

    async fn list_pending_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Task>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|t| t.status == Status::Pending && t.updated_at < cutoff)
            .cloned()
            .collect())
    }

    async fn list_gc_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Task>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.values().filter(|t| t.created_at < cutoff).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(status: Status) -> (FakeRelationalStore, Task) {
        let store = FakeRelationalStore::new();
        let mut task = Task::new("t1".into(), "tasks/t1".into(), "a cat".into());
        task.status = status;
        (store, task)
    }

    #[tokio::test]
    async fn claim_guard_rejects_terminal_rows() {
        let (store, task) = seeded(Status::Done);
        store.insert(&task).await.unwrap();
        assert!(store.claim_for_processing(&task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn claim_guard_accepts_pending_and_increments_attempts() {
        let (store, task) = seeded(Status::Pending);
        store.insert(&task).await.unwrap();
        let claimed = store.claim_for_processing(&task.id).await.unwrap().unwrap();
        assert_eq!(claimed.status, Status::Processing);
        assert_eq!(claimed.attempts, 1);
    }

    #[tokio::test]
    async fn duplicate_claim_is_idempotent_dedup() {
        // P2: a second worker racing the claim guard for an already-Processing
        // row still matches (Processing is claimable) but a second `complete`
        // after the first succeeds must not double-apply.
        let (store, task) = seeded(Status::Pending);
        store.insert(&task).await.unwrap();
        store.claim_for_processing(&task.id).await.unwrap();
        assert!(store.complete(&task.id, "a", "b").await.unwrap());
        // Once Done, a second completion attempt must not match.
        assert!(!store.complete(&task.id, "x", "y").await.unwrap());
        let row = store.get(&task.id).await.unwrap().unwrap();
        assert_eq!(row.alt1.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn approve_requires_done() {
        let (store, task) = seeded(Status::Processing);
        store.insert(&task).await.unwrap();
        assert!(!store.approve(&task.id, 1, "A cat.").await.unwrap());

        store.complete(&task.id, "A", "B").await.unwrap();
        assert!(store.approve(&task.id, 1, "A cat.").await.unwrap());
        let row = store.get(&task.id).await.unwrap().unwrap();
        assert_eq!(row.selected_index, Some(1));
    }
}
