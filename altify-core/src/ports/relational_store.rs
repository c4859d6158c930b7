//! Relational Store (RS) adapter contract (spec §3, §4.5).
//!
//! Rather than a single generic `UpdateIfStatusIn(id, allowed, patch)` call,
//! each named transition gets its own typed method — consistent with the
//! preference for explicit message and DTO records with typed fields over
//! dynamic dict payloads. Every method that performs a conditional update
//! returns whether it actually matched a row, so callers can implement the
//! idempotent-dedup behavior required by P2 without inspecting row counts
//! by hand.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::Task;
use crate::error::Result;

#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Insert a new `Pending` row (spec §4.1 step 3).
    async fn insert(&self, task: &Task) -> Result<()>;

    /// Fetch a task by id.
    async fn get(&self, id: &str) -> Result<Option<Task>>;

    /// Delete a row (ingress rollback, spec §4.1; GC sweep, spec §7).
    async fn delete(&self, id: &str) -> Result<()>;

    /// The worker's optimistic claim guard (spec §4.2 step 3):
    /// `UPDATE tasks SET status='PROCESSING', attempts=attempts+1, updated_at=now()
    ///  WHERE id=? AND status IN ('PENDING','PROCESSING')`.
    ///
    /// Returns the post-update row, or `None` if no row matched (the task was
    /// already terminal — the caller acks and drops per P2).
    async fn claim_for_processing(&self, id: &str) -> Result<Option<Task>>;

    /// Worker success path (spec §4.2 step 6): set `alt1`/`alt2`, `status=Done`,
    /// clear `last_error`. Single update, guarded to only affect rows still
    /// `Processing` so a duplicate delivery that raced past the claim guard
    /// cannot clobber a result written by the delivery that won.
    async fn complete(&self, id: &str, alt1: &str, alt2: &str) -> Result<bool>;

    /// Worker deterministic-failure path (spec §4.2 step 8).
    async fn fail_deterministic(&self, id: &str, reason: &str) -> Result<bool>;

    /// DLQ consumer re-drive (spec §4.3 step 2): `Processing -> Pending`, the
    /// one permitted non-monotone transition (I6). Does not touch `attempts`;
    /// the worker's claim guard increments it again on redelivery.
    async fn reset_to_pending(&self, id: &str) -> Result<bool>;

    /// DLQ consumer budget-exhausted path (spec §4.3 step 3).
    async fn fail_from_dlq(&self, id: &str, reason: &str) -> Result<bool>;

    /// Approval gate (spec §4.1, P7): succeeds only if the row is currently
    /// `Done`. Returns `false` (not an error) on precondition failure so
    /// callers can map it to `PreconditionFailed` without a round-trip `get`.
    async fn approve(&self, id: &str, selected_index: u8, final_alt: &str) -> Result<bool>;

    /// Rows in `Pending` with `updated_at` older than `cutoff` — candidates
    /// for the ingress reconciler (spec §4.1, index on `(status, updated_at)`).
    async fn list_pending_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Task>>;

    /// Rows with `created_at` older than `cutoff` — candidates for the GC
    /// sweep (spec §7). The caller still checks BS existence per row before
    /// deleting.
    async fn list_gc_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Task>>;
}
