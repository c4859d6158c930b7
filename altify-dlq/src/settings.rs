use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct DlqSettings {
    /// Redrive budget (spec §4.3): above this many delivery attempts the
    /// task is settled `FAILED` instead of redriven.
    #[arg(long, env = "MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// `base` in the backoff formula `base * 2^(attempts-1)` (spec §4.3).
    #[arg(long, env = "DLQ_BACKOFF_BASE_MS", default_value_t = 1_000)]
    pub backoff_base_ms: u64,

    /// Cap on the computed backoff delay (spec §4.3: "capped").
    #[arg(long, env = "DLQ_BACKOFF_CAP_MS", default_value_t = 60_000)]
    pub backoff_cap_ms: u64,
}

impl Default for DlqSettings {
    fn default() -> Self {
        Self { max_attempts: 3, backoff_base_ms: 1_000, backoff_cap_ms: 60_000 }
    }
}

/// `base * 2^(attempts-1)`, capped. `attempts` is 1-indexed (the delivery
/// that just dead-lettered counts as one).
pub fn backoff_delay_ms(settings: &DlqSettings, attempts: u32) -> u64 {
    let exponent = attempts.saturating_sub(1).min(32);
    let scaled = settings.backoff_base_ms.saturating_mul(1u64 << exponent);
    scaled.min(settings.backoff_cap_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        let settings = DlqSettings { max_attempts: 5, backoff_base_ms: 1_000, backoff_cap_ms: 10_000 };
        assert_eq!(backoff_delay_ms(&settings, 1), 1_000);
        assert_eq!(backoff_delay_ms(&settings, 2), 2_000);
        assert_eq!(backoff_delay_ms(&settings, 3), 4_000);
        assert_eq!(backoff_delay_ms(&settings, 4), 8_000);
        assert_eq!(backoff_delay_ms(&settings, 5), 10_000, "exceeds cap, clamps to it");
    }
}
