//! Row <-> domain-type mapping for the `tasks` table.

use altify_core::domain::{Status, Task};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::tasks;
use crate::DbError;

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRecord {
    pub id: String,
    pub image_key: String,
    pub context_text: String,
    pub status: String,
    pub alt1: Option<String>,
    pub alt2: Option<String>,
    pub selected_index: Option<i16>,
    pub final_alt: Option<String>,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl TaskRecord {
    pub fn from_task(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            image_key: task.image_key.clone(),
            context_text: task.context_text.clone(),
            status: task.status.as_str().to_string(),
            alt1: task.alt1.clone(),
            alt2: task.alt2.clone(),
            selected_index: task.selected_index.map(i16::from),
            final_alt: task.final_alt.clone(),
            attempts: task.attempts as i32,
            created_at: task.created_at,
            updated_at: task.updated_at,
            last_error: task.last_error.clone(),
        }
    }

    pub fn into_task(self) -> Result<Task, DbError> {
        let status = Status::from_str(&self.status)
            .ok_or_else(|| DbError::Corrupt(format!("unknown status {:?} on task {}", self.status, self.id)))?;
        Ok(Task {
            id: self.id,
            image_key: self.image_key,
            context_text: self.context_text,
            status,
            alt1: self.alt1,
            alt2: self.alt2,
            selected_index: self.selected_index.map(|i| i as u8),
            final_alt: self.final_alt,
            attempts: self.attempts as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_error: self.last_error,
        })
    }
}
