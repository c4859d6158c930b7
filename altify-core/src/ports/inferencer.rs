//! The `Inferencer` contract (spec §4.2): an opaque vision-language backend.

use async_trait::async_trait;
use thiserror::Error;

/// Failure classes specific to the `Inferencer` boundary (spec §4.2).
/// Distinct from [`crate::error::AltifyError`] because the mapping from
/// `InferencerFailure` to the transient/deterministic split is a worker-loop
/// policy decision (spec §4.2 steps 6-8), not a property of the failure
/// itself.
#[derive(Debug, Error)]
pub enum InferencerFailure {
    #[error("inference ran out of memory")]
    Oom,
    #[error("inference timed out")]
    Timeout,
    #[error("could not decode input image: {0}")]
    DecodeError(String),
    #[error("internal inference error: {0}")]
    Internal(String),
}

/// Opaque capability that turns (image, context) into `k` candidate alt-text
/// strings. Must be safe to call sequentially on one slot; not required to
/// be thread-safe (spec §4.2).
#[async_trait]
pub trait Inferencer: Send + Sync {
    /// Generate `k` candidate descriptions. On success, must return exactly
    /// `k` entries using distinct decoding settings so the pair is
    /// observably different when the model is non-degenerate (spec §8, P4).
    /// The mechanism (two samplings, two prompts, nucleus variation) is left
    /// to the implementer (spec §9, Open Question).
    async fn generate(
        &self,
        image_bytes: &[u8],
        context: &str,
        k: u8,
    ) -> Result<Vec<String>, InferencerFailure>;
}
