use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{Inferencer, InferencerFailure};

/// A scripted outcome for one call to [`ScriptedInferencer::generate`].
pub enum Outcome {
    Candidates(Vec<String>),
    Fail(InferencerFailure),
}

/// An [`Inferencer`] that replays a fixed sequence of outcomes, one per
/// call, repeating the last entry once exhausted. Used to drive scenarios
/// like "OOM twice, then succeed" (spec §8, scenario 4) deterministically.
pub struct ScriptedInferencer {
    outcomes: Mutex<Vec<Outcome>>,
    calls: Mutex<usize>,
}

impl ScriptedInferencer {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            calls: Mutex::new(0),
        }
    }

    /// Always returns the same two candidates.
    pub fn always(alt1: impl Into<String>, alt2: impl Into<String>) -> Self {
        Self::new(vec![Outcome::Candidates(vec![alt1.into(), alt2.into()])])
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Inferencer for ScriptedInferencer {
    async fn generate(&self, _image_bytes: &[u8], _context: &str, _k: u8) -> Result<Vec<String>, InferencerFailure> {
        let mut calls = self.calls.lock().unwrap();
        let index = *calls;
        *calls += 1;

        let outcomes = self.outcomes.lock().unwrap();
        let outcome = outcomes
            .get(index)
            .or_else(|| outcomes.last())
            .expect("ScriptedInferencer requires at least one outcome");

        match outcome {
            Outcome::Candidates(candidates) => Ok(candidates.clone()),
            Outcome::Fail(InferencerFailure::Oom) => Err(InferencerFailure::Oom),
            Outcome::Fail(InferencerFailure::Timeout) => Err(InferencerFailure::Timeout),
            Outcome::Fail(InferencerFailure::DecodeError(msg)) => Err(InferencerFailure::DecodeError(msg.clone())),
            Outcome::Fail(InferencerFailure::Internal(msg)) => Err(InferencerFailure::Internal(msg.clone())),
        }
    }
}
