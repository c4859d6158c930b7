//! PostgreSQL-backed [`RelationalStore`](altify_core::ports::RelationalStore).
//!
//! Every conditional transition is a single `UPDATE ... WHERE id = ? AND
//! status IN (...) RETURNING *` (or a plain row-count `UPDATE` where the
//! port only needs a bool), so the guard and the write happen atomically
//! under Postgres's row-level locking — no read-modify-write race window.

use altify_core::domain::Task;
use altify_core::error::{AltifyError, Result};
use altify_core::ports::RelationalStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::TaskRecord;
use super::pool::{DbError, DbPool};
use super::schema::tasks;

pub struct PostgresRelationalStore {
    pool: DbPool,
}

impl PostgresRelationalStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_err(e: DbError) -> AltifyError {
    match e {
        DbError::Pool(msg) => AltifyError::Unavailable(msg),
        DbError::Query(diesel::result::Error::NotFound) => AltifyError::NotFound("task".to_string()),
        DbError::Query(err) => AltifyError::Unavailable(err.to_string()),
        DbError::Migration(msg) => AltifyError::Internal(msg),
        DbError::Corrupt(msg) => AltifyError::Internal(msg),
    }
}

async fn records_to_tasks(records: Vec<TaskRecord>) -> Result<Vec<Task>> {
    records
        .into_iter()
        .map(|r| r.into_task().map_err(map_err))
        .collect()
}

#[async_trait]
impl RelationalStore for PostgresRelationalStore {
    async fn insert(&self, task: &Task) -> Result<()> {
        let mut conn = self.pool.get().await.map_err(|e| map_err(DbError::Pool(e.to_string())))?;
        diesel::insert_into(tasks::table)
            .values(TaskRecord::from_task(task))
            .execute(&mut conn)
            .await
            .map_err(|e| map_err(DbError::Query(e)))?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Task>> {
        let mut conn = self.pool.get().await.map_err(|e| map_err(DbError::Pool(e.to_string())))?;
        let record: Option<TaskRecord> = tasks::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| map_err(DbError::Query(e)))?;
        match record {
            Some(r) => Ok(Some(r.into_task().map_err(map_err)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut conn = self.pool.get().await.map_err(|e| map_err(DbError::Pool(e.to_string())))?;
        diesel::delete(tasks::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(|e| map_err(DbError::Query(e)))?;
        Ok(())
    }

    async fn claim_for_processing(&self, id: &str) -> Result<Option<Task>> {
        let mut conn = self.pool.get().await.map_err(|e| map_err(DbError::Pool(e.to_string())))?;
        let record: Option<TaskRecord> = diesel::update(
            tasks::table.filter(tasks::id.eq(id).and(tasks::status.eq_any(["PENDING", "PROCESSING"]))),
        )
        .set((
            tasks::status.eq("PROCESSING"),
            tasks::attempts.eq(tasks::attempts + 1),
            tasks::updated_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(|e| map_err(DbError::Query(e)))?;
        match record {
            Some(r) => Ok(Some(r.into_task().map_err(map_err)?)),
            None => Ok(None),
        }
    }

    async fn complete(&self, id: &str, alt1: &str, alt2: &str) -> Result<bool> {
        let mut conn = self.pool.get().await.map_err(|e| map_err(DbError::Pool(e.to_string())))?;
        let rows = diesel::update(tasks::table.filter(tasks::id.eq(id).and(tasks::status.eq("PROCESSING"))))
            .set((
                tasks::alt1.eq(alt1),
                tasks::alt2.eq(alt2),
                tasks::status.eq("DONE"),
                tasks::last_error.eq(None::<String>),
                tasks::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(|e| map_err(DbError::Query(e)))?;
        Ok(rows > 0)
    }

    async fn fail_deterministic(&self, id: &str, reason: &str) -> Result<bool> {
        let mut conn = self.pool.get().await.map_err(|e| map_err(DbError::Pool(e.to_string())))?;
        let rows = diesel::update(
            tasks::table.filter(tasks::id.eq(id).and(tasks::status.ne("DONE").and(tasks::status.ne("FAILED")))),
        )
        .set((
            tasks::status.eq("FAILED"),
            tasks::last_error.eq(reason),
            tasks::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await
        .map_err(|e| map_err(DbError::Query(e)))?;
        Ok(rows > 0)
    }

    async fn reset_to_pending(&self, id: &str) -> Result<bool> {
        let mut conn = self.pool.get().await.map_err(|e| map_err(DbError::Pool(e.to_string())))?;
        let rows = diesel::update(tasks::table.filter(tasks::id.eq(id).and(tasks::status.eq("PROCESSING"))))
            .set((tasks::status.eq("PENDING"), tasks::updated_at.eq(Utc::now())))
            .execute(&mut conn)
            .await
            .map_err(|e| map_err(DbError::Query(e)))?;
        Ok(rows > 0)
    }

    async fn fail_from_dlq(&self, id: &str, reason: &str) -> Result<bool> {
        // Same guard as `fail_deterministic`: the DLQ consumer can land on a
        // row that is already terminal if it races a worker's own failure path.
        self.fail_deterministic(id, reason).await
    }

    async fn approve(&self, id: &str, selected_index: u8, final_alt: &str) -> Result<bool> {
        let mut conn = self.pool.get().await.map_err(|e| map_err(DbError::Pool(e.to_string())))?;
        let rows = diesel::update(tasks::table.filter(tasks::id.eq(id).and(tasks::status.eq("DONE"))))
            .set((
                tasks::selected_index.eq(selected_index as i16),
                tasks::final_alt.eq(final_alt),
                tasks::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map_err(|e| map_err(DbError::Query(e)))?;
        Ok(rows > 0)
    }

    async fn list_pending_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Task>> {
        let mut conn = self.pool.get().await.map_err(|e| map_err(DbError::Pool(e.to_string())))?;
        let records: Vec<TaskRecord> = tasks::table
            .filter(tasks::status.eq("PENDING").and(tasks::updated_at.lt(cutoff)))
            .load(&mut conn)
            .await
            .map_err(|e| map_err(DbError::Query(e)))?;
        records_to_tasks(records).await
    }

    async fn list_gc_candidates(&self, cutoff: DateTime<Utc>) -> Result<Vec<Task>> {
        let mut conn = self.pool.get().await.map_err(|e| map_err(DbError::Pool(e.to_string())))?;
        let records: Vec<TaskRecord> = tasks::table
            .filter(tasks::created_at.lt(cutoff))
            .load(&mut conn)
            .await
            .map_err(|e| map_err(DbError::Query(e)))?;
        records_to_tasks(records).await
    }
}
