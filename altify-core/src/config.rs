//! Small env-parsing helpers shared by every binary's settings struct,
//! matching `foia`'s convention of plain env vars read at process init
//! (spec §6: "Workers and autoscaler read: ... `MIN_WORKERS`, `MAX_WORKERS`, ...").

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Read an env var and parse it, falling back to `default` if unset or unparsable.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read an env var holding a number of seconds, falling back to `default`.
pub fn env_secs_or(key: &str, default: Duration) -> Duration {
    Duration::from_secs(env_or(key, default.as_secs()))
}

/// Queue names shared by every component (spec §6).
pub mod queues {
    pub const MAIN: &str = "tasks.main";
    pub const DLQ: &str = "tasks.dlq";

    /// The delayed-retry queue name for a given backoff delay (spec §6).
    pub fn wait(delay_ms: u64) -> String {
        format!("tasks.wait.{delay_ms}")
    }
}
