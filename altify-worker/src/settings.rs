use std::time::Duration;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct WorkerSettings {
    /// Hard inference timeout; exceeding it is classified as transient
    /// (spec §5: "Inference hard timeout `T_inf` (default 60 s) -> treated
    /// as OOM/transient").
    #[arg(long, env = "INFER_TIMEOUT_SEC", default_value_t = 60)]
    pub infer_timeout_secs: u64,
}

impl WorkerSettings {
    pub fn infer_timeout(&self) -> Duration {
        Duration::from_secs(self.infer_timeout_secs)
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self { infer_timeout_secs: 60 }
    }
}
