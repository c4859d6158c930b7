use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::ports::Orchestrator;

/// Records every `scale` call for assertions; never fails.
#[derive(Default)]
pub struct FakeOrchestrator {
    calls: Mutex<Vec<(String, u32)>>,
}

impl FakeOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_replica_count(&self) -> Option<u32> {
        self.calls.lock().unwrap().last().map(|(_, n)| *n)
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn scale(&self, service: &str, n: u32) -> Result<()> {
        self.calls.lock().unwrap().push((service.to_string(), n));
        Ok(())
    }
}
