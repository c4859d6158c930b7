use std::time::Duration;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct AutoscalerSettings {
    #[arg(long, env = "MIN_WORKERS", default_value_t = 1)]
    pub min_workers: u32,

    #[arg(long, env = "MAX_WORKERS", default_value_t = 8)]
    pub max_workers: u32,

    /// `target_per_worker` (spec §4.4): the queue depth one worker is
    /// expected to drain per poll interval.
    #[arg(long, env = "SCALE_TARGET", default_value_t = 4)]
    pub target_per_worker: u32,

    /// `T_poll` (spec §4.4).
    #[arg(long, env = "T_POLL_SECS", default_value_t = 10)]
    pub poll_interval_secs: u64,

    /// `T_cool` (spec §4.4).
    #[arg(long, env = "COOLDOWN_SEC", default_value_t = 120)]
    pub cooldown_secs: u64,

    /// Name passed to `Orchestrator::scale` identifying the worker
    /// deployment/service to resize.
    #[arg(long, env = "AUTOSCALE_SERVICE", default_value = "altify-worker")]
    pub service: String,
}

impl AutoscalerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl Default for AutoscalerSettings {
    fn default() -> Self {
        Self {
            min_workers: 1,
            max_workers: 8,
            target_per_worker: 4,
            poll_interval_secs: 10,
            cooldown_secs: 120,
            service: "altify-worker".to_string(),
        }
    }
}

/// `clamp(ceil(ready / target_per_worker), min_workers, max_workers)` (spec §4.4 step 2).
pub fn compute_desired(ready: u64, target_per_worker: u32, min_workers: u32, max_workers: u32) -> u32 {
    let target = target_per_worker.max(1) as u64;
    let raw = ready.div_ceil(target).min(u32::MAX as u64) as u32;
    raw.clamp(min_workers, max_workers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceils_and_clamps_to_bounds() {
        assert_eq!(compute_desired(0, 4, 1, 8), 1, "clamps up to min_workers even at zero depth");
        assert_eq!(compute_desired(8, 4, 1, 8), 2);
        assert_eq!(compute_desired(9, 4, 1, 8), 3, "ceil, not floor");
        assert_eq!(compute_desired(40, 4, 1, 8), 8, "clamps down to max_workers");
    }
}
