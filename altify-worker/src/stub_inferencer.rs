//! A deterministic reference [`Inferencer`] (spec §4.2, §9: "the mechanism
//! ... is left to the implementer"). Produces two observably-different
//! candidates by varying phrasing around the supplied context rather than
//! actually looking at `image_bytes` — suitable for local development and
//! integration tests, never for production (gated behind the
//! `stub-inferencer` feature and `cfg(test)`).

use altify_core::ports::{Inferencer, InferencerFailure};
use async_trait::async_trait;

pub struct StubInferencer;

#[async_trait]
impl Inferencer for StubInferencer {
    async fn generate(&self, _image_bytes: &[u8], context: &str, k: u8) -> Result<Vec<String>, InferencerFailure> {
        if k != 2 {
            return Err(InferencerFailure::Internal(format!("StubInferencer only supports k=2, got {k}")));
        }
        let context = context.trim();
        if context.is_empty() {
            return Err(InferencerFailure::DecodeError("empty context".to_string()));
        }
        Ok(vec![format!("{context}."), format!("Image depicting {context}.")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn produces_two_distinct_nonempty_candidates() {
        let candidates = StubInferencer.generate(b"", "cat on mat", 2).await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_ne!(candidates[0], candidates[1]);
        assert!(candidates.iter().all(|c| !c.trim().is_empty()));
    }

    #[tokio::test]
    async fn empty_context_is_a_decode_error() {
        let err = StubInferencer.generate(b"", "   ", 2).await.unwrap_err();
        assert!(matches!(err, InferencerFailure::DecodeError(_)));
    }
}
