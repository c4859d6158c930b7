//! The `Orchestrator` capability (spec §4.4): opaque replica-count control.

use async_trait::async_trait;

use crate::error::Result;

/// Issues replica-count changes to whatever deploys worker processes
/// (Kubernetes, a process supervisor, ...). Opaque per spec §4.4 step 5.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Scale `service` to exactly `n` replicas.
    async fn scale(&self, service: &str, n: u32) -> Result<()>;
}
