//! The `Task` record — the unit of work flowing through the pipeline.
//!
//! Every field, invariant, and transition (§3)
//! named there is represented here. See [`Status`] for the state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of `context_text`, in bytes (spec §3).
pub const MAX_CONTEXT_LEN: usize = 16 * 1024;

/// Maximum length of a single alt-text candidate, in bytes (spec §3).
pub const MAX_ALT_LEN: usize = 1024;

/// Task lifecycle state (spec §4.2).
///
/// Transitions are monotone except the DLQ-driven `Processing -> Pending`
/// re-drive (I6). `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pending,
    Processing,
    Done,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Processing => "PROCESSING",
            Status::Done => "DONE",
            Status::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Status::Pending),
            "PROCESSING" => Some(Status::Processing),
            "DONE" => Some(Status::Done),
            "FAILED" => Some(Status::Failed),
            _ => None,
        }
    }

    /// States a worker may pick up and transition out of (spec §4.2 step 3).
    pub fn claimable() -> &'static [Status] {
        &[Status::Pending, Status::Processing]
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Done | Status::Failed)
    }
}

/// The `tasks` row (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub image_key: String,
    pub context_text: String,
    pub status: Status,
    pub alt1: Option<String>,
    pub alt2: Option<String>,
    pub selected_index: Option<u8>,
    pub final_alt: Option<String>,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl Task {
    /// Construct a freshly-allocated `Pending` task (ingress allocation, spec §4.1 step 1).
    pub fn new(id: String, image_key: String, context_text: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            image_key,
            context_text,
            status: Status::Pending,
            alt1: None,
            alt2: None,
            selected_index: None,
            final_alt: None,
            attempts: 0,
            created_at: now,
            updated_at: now,
            last_error: None,
        }
    }

    /// I1/I2: candidates are present iff the task is `Done`.
    pub fn check_candidate_invariant(&self) -> bool {
        match self.status {
            Status::Done => self.alt1.is_some() && self.alt2.is_some(),
            Status::Pending | Status::Processing => self.alt1.is_none() && self.alt2.is_none(),
            Status::Failed => true,
        }
    }

    /// I3: an approval implies a `Done`, settled task.
    pub fn check_approval_invariant(&self) -> bool {
        match self.selected_index {
            Some(_) => self.status == Status::Done && self.final_alt.as_deref().is_some_and(|s| !s.is_empty()),
            None => true,
        }
    }
}
