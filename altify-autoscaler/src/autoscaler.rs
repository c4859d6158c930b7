//! The control loop (spec §4.4).

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use altify_core::config::queues;
use altify_core::error::Result;
use altify_core::ports::{Broker, Orchestrator};

use crate::settings::{compute_desired, AutoscalerSettings};

/// Tracks the replica count this loop believes is live and how long the
/// queue has continuously wanted fewer replicas, so scale-down can honor
/// `T_cool` (spec §4.4 step 4) across ticks.
pub struct Autoscaler {
    settings: AutoscalerSettings,
    current: u32,
    below_current_since: Option<Instant>,
}

impl Autoscaler {
    pub fn new(settings: AutoscalerSettings) -> Self {
        let current = settings.min_workers;
        Self { settings, current, below_current_since: None }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    /// Run one poll tick against `bk`/`orchestrator`, as of `now`. `now` is
    /// threaded in (rather than read internally) so tests can simulate the
    /// passage of the cooldown window without real sleeps.
    pub async fn tick(&mut self, bk: &dyn Broker, orchestrator: &dyn Orchestrator, now: Instant) -> Result<()> {
        let depth = bk.queue_depth(queues::MAIN).await?;
        let desired = compute_desired(depth.ready, self.settings.target_per_worker, self.settings.min_workers, self.settings.max_workers);

        if desired > self.current {
            // Step 3: scale up immediately, no cooldown (spec §4.4).
            orchestrator.scale(&self.settings.service, desired).await?;
            tracing::info!(from = self.current, to = desired, ready = depth.ready, "autoscaler scaling up");
            self.current = desired;
            self.below_current_since = None;
        } else if desired < self.current {
            if depth.unacked > 0 {
                // Step 2: "treat workers with unacked > 0 as busy" — resist flapping.
                tracing::debug!(unacked = depth.unacked, "autoscaler deferring scale-down: workers still busy");
                self.below_current_since = None;
            } else {
                let since = *self.below_current_since.get_or_insert(now);
                if now.duration_since(since) >= self.settings.cooldown() {
                    // Step 4: scale-down only after a full cooldown window of sustained low depth.
                    orchestrator.scale(&self.settings.service, desired).await?;
                    tracing::info!(from = self.current, to = desired, ready = depth.ready, "autoscaler scaling down after cooldown");
                    self.current = desired;
                    self.below_current_since = None;
                }
            }
        } else {
            self.below_current_since = None;
        }
        Ok(())
    }
}

/// Poll `bk`'s queue depth on `settings.poll_interval()` and drive
/// `orchestrator` accordingly, until `cancel` fires (spec §4.4 step 1).
pub async fn run(bk: Arc<dyn Broker>, orchestrator: Arc<dyn Orchestrator>, settings: AutoscalerSettings, cancel: CancellationToken) -> anyhow::Result<()> {
    let mut autoscaler = Autoscaler::new(settings.clone());
    let mut ticker = tokio::time::interval(settings.poll_interval());
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            _ = ticker.tick() => {
                if let Err(e) = autoscaler.tick(bk.as_ref(), orchestrator.as_ref(), Instant::now()).await {
                    tracing::warn!(error = %e, "autoscaler tick failed, will retry next poll");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use altify_core::fakes::{FakeBroker, FakeOrchestrator};
    use std::time::Duration;

    fn settings() -> AutoscalerSettings {
        AutoscalerSettings { min_workers: 1, max_workers: 8, target_per_worker: 4, poll_interval_secs: 10, cooldown_secs: 120, service: "w".into() }
    }

    async fn seed_depth(bk: &FakeBroker, ready: usize) {
        for i in 0..ready {
            bk.publish(queues::MAIN, format!("msg{i}").into_bytes(), None).await.unwrap();
        }
    }

    // Scenario 6: 40 messages, target=4, min=1, max=8 -> scales to 8, never exceeds it.
    #[tokio::test]
    async fn scales_up_immediately_and_respects_max() {
        let bk = FakeBroker::new();
        seed_depth(&bk, 40).await;
        let orchestrator = FakeOrchestrator::new();
        let mut autoscaler = Autoscaler::new(settings());

        autoscaler.tick(&bk, &orchestrator, Instant::now()).await.unwrap();

        assert_eq!(autoscaler.current(), 8);
        assert_eq!(orchestrator.last_replica_count(), Some(8));
    }

    #[tokio::test]
    async fn never_exceeds_max_workers_even_with_more_depth() {
        let bk = FakeBroker::new();
        seed_depth(&bk, 1000).await;
        let orchestrator = FakeOrchestrator::new();
        let mut autoscaler = Autoscaler::new(settings());

        autoscaler.tick(&bk, &orchestrator, Instant::now()).await.unwrap();
        assert_eq!(autoscaler.current(), 8);
    }

    #[tokio::test]
    async fn scale_down_waits_for_full_cooldown() {
        let bk = FakeBroker::new();
        seed_depth(&bk, 40).await;
        let orchestrator = FakeOrchestrator::new();
        let mut autoscaler = Autoscaler::new(settings());

        let t0 = Instant::now();
        autoscaler.tick(&bk, &orchestrator, t0).await.unwrap();
        assert_eq!(autoscaler.current(), 8);

        // Drain the queue: depth now wants min_workers=1.
        let mut consumer = bk.consume(queues::MAIN, 1000).await.unwrap();
        for _ in 0..40 {
            consumer.recv().await.unwrap().unwrap().ack().await.unwrap();
        }

        // Cooldown not yet elapsed: still 8.
        autoscaler.tick(&bk, &orchestrator, t0 + Duration::from_secs(60)).await.unwrap();
        assert_eq!(autoscaler.current(), 8);

        // Cooldown elapsed since depth first dropped: scales down.
        autoscaler.tick(&bk, &orchestrator, t0 + Duration::from_secs(61 + 120)).await.unwrap();
        assert_eq!(autoscaler.current(), 1);
    }

    #[tokio::test]
    async fn never_drops_below_min_workers_at_zero_depth() {
        let bk = FakeBroker::new();
        let orchestrator = FakeOrchestrator::new();
        let mut autoscaler = Autoscaler::new(settings());
        autoscaler.tick(&bk, &orchestrator, Instant::now()).await.unwrap();
        assert_eq!(autoscaler.current(), 1);
    }
}
