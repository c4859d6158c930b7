//! The default [`Orchestrator`] (spec §4.4 step 5): opaque per spec, since
//! no concrete container/VM orchestration API is named in the spec or the
//! teacher corpus. Records the intended scale as a structured log line;
//! deployments that need a real backend (Kubernetes, a process supervisor)
//! implement [`Orchestrator`] themselves.

use altify_core::error::Result;
use altify_core::ports::Orchestrator;
use async_trait::async_trait;

pub struct LoggingOrchestrator;

#[async_trait]
impl Orchestrator for LoggingOrchestrator {
    async fn scale(&self, service: &str, n: u32) -> Result<()> {
        tracing::info!(service, replicas = n, "orchestrator scale request (logging-only backend)");
        Ok(())
    }
}
