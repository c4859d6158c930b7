//! HTTP-surface settings for the ingress API. Concrete adapter settings
//! (`DATABASE_URL`, AMQP address, blob root) belong to whichever binary
//! wires the adapters together (`altify-cli`), not to this crate — only the
//! server's own concerns (host/port, sweep cadence) live here.

use std::time::Duration;

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct ServerSettings {
    /// Address to bind the HTTP listener on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP listener on.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// How often the reconciler sweep runs.
    #[arg(long, env = "RECONCILE_INTERVAL_SECS", default_value_t = 10)]
    pub reconcile_interval_secs: u64,

    /// Grace window before a `PENDING` row with no message is re-published
    /// (spec §4.1: "a grace window `T_reconcile` (e.g., 30 s)").
    #[arg(long, env = "T_RECONCILE_SECS", default_value_t = 30)]
    pub reconcile_grace_secs: u64,

    /// How often the garbage-collector sweep runs.
    #[arg(long, env = "GC_INTERVAL_SECS", default_value_t = 3600)]
    pub gc_interval_secs: u64,

    /// `T_gc`: rows older than this with no matching blob are orphans
    /// (spec §7). Default is a conservative 24h.
    #[arg(long, env = "ALTIFY_GC_WINDOW_SECS", default_value_t = 86_400)]
    pub gc_window_secs: u64,
}

impl ServerSettings {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    pub fn reconcile_grace(&self) -> Duration {
        Duration::from_secs(self.reconcile_grace_secs)
    }

    pub fn gc_interval(&self) -> Duration {
        Duration::from_secs(self.gc_interval_secs)
    }

    pub fn gc_window(&self) -> Duration {
        Duration::from_secs(self.gc_window_secs)
    }
}
