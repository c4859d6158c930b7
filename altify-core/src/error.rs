//! The error taxonomy (§7), as a `thiserror` enum.
//!
//! One variant per externally-observable failure class, with `#[from]`
//! conversions wired in by the adapter crates that know about concrete
//! error types.

use thiserror::Error;

/// Top-level error type returned by every Altify adapter and service.
#[derive(Debug, Error)]
pub enum AltifyError {
    /// Validation failure at ingress. Not retried; surfaced as 4xx.
    #[error("bad input: {0}")]
    BadInput(String),

    /// Transient adapter failure (BS/RS/BK unreachable). Retryable.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Inference backend failed transiently (OOM/timeout). Routed to DLQ.
    #[error("transient inference failure: {0}")]
    TransientInference(String),

    /// Inference backend failed deterministically (decode/empty output). Terminal.
    #[error("deterministic inference failure: {0}")]
    DeterministicInference(String),

    /// A referenced blob or row does not exist. Terminal.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request is well-formed but the task is not in a state that allows it
    /// (e.g. `Approve` on a task that is not yet `Done`).
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Rollback failure, invariant breach, or any other bug-shaped condition.
    /// Logged; task is left inspectable rather than silently dropped.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AltifyError {
    /// Whether this error class should ever cause a *worker* to terminate a task.
    /// Only the DLQ consumer (with budget) or a deterministic class may do so
    /// (spec §7, "workers never escalate transient errors to terminal").
    pub fn is_terminal_at_worker(&self) -> bool {
        matches!(
            self,
            AltifyError::DeterministicInference(_) | AltifyError::NotFound(_) | AltifyError::BadInput(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AltifyError>;
