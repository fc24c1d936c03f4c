//! Delay calculation between exchanges of one operation.

use std::time::Duration;

use rand::Rng;

/// Computes how long to wait before the next dispatch.
///
/// Retryable-error backoff is client-invented and jittered so that many
/// clients do not retry in lockstep. Poll cadence comes from the server
/// and is used as-is.
#[derive(Debug, Clone, Copy)]
pub struct BackoffCalculator {
    /// Base delay for the exponential series.
    pub default_wait: Duration,
    /// Cap applied to the exponential base before jitter.
    pub max_base_wait: Duration,
}

impl Default for BackoffCalculator {
    fn default() -> Self {
        Self {
            default_wait: Duration::from_millis(1000),
            max_base_wait: Duration::from_secs(60),
        }
    }
}

impl BackoffCalculator {
    /// Delay before the next dispatch.
    ///
    /// With a server hint the hint is returned unchanged. Otherwise the
    /// capped exponential base for `retry_count` gets a uniform jitter
    /// factor in `[0.5, 1.5]`.
    pub fn delay(&self, retry_count: u32, server_hint: Option<Duration>) -> Duration {
        if let Some(hint) = server_hint {
            return hint;
        }
        let jitter = rand::thread_rng().gen_range(0.5..=1.5);
        self.jittered(retry_count, jitter)
    }

    /// Capped exponential base, before jitter.
    pub fn base_delay(&self, retry_count: u32) -> Duration {
        let default_ms = self.default_wait.as_millis() as u64;
        let exp = default_ms.saturating_mul(1u64 << retry_count.min(32));
        Duration::from_millis(exp.min(self.max_base_wait.as_millis() as u64))
    }

    fn jittered(&self, retry_count: u32, jitter: f64) -> Duration {
        let base_ms = self.base_delay(retry_count).as_millis() as f64;
        Duration::from_millis((base_ms * jitter).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_delay_doubles_then_caps() {
        let calc = BackoffCalculator::default();
        assert_eq!(calc.base_delay(0).as_millis(), 1000);
        assert_eq!(calc.base_delay(1).as_millis(), 2000);
        assert_eq!(calc.base_delay(5).as_millis(), 32_000);
        assert_eq!(calc.base_delay(6).as_millis(), 60_000);
        assert_eq!(calc.base_delay(u32::MAX).as_millis(), 60_000);
    }

    #[test]
    fn test_delay_within_jitter_bounds() {
        let calc = BackoffCalculator::default();
        for n in 0..12 {
            let base = calc.base_delay(n).as_millis() as u64;
            for _ in 0..200 {
                let d = calc.delay(n, None).as_millis() as u64;
                assert!(d >= base / 2, "retry {}: {}ms below {}ms", n, d, base / 2);
                assert!(d <= base * 3 / 2, "retry {}: {}ms above {}ms", n, d, base * 3 / 2);
            }
        }
    }

    #[test]
    fn test_jitter_extremes() {
        let calc = BackoffCalculator::default();
        assert_eq!(calc.jittered(2, 0.5).as_millis(), 2000);
        assert_eq!(calc.jittered(2, 1.5).as_millis(), 6000);
    }

    #[test]
    fn test_server_hint_is_used_unjittered() {
        let calc = BackoffCalculator::default();
        let hint = Duration::from_millis(2500);
        for n in 0..5 {
            assert_eq!(calc.delay(n, Some(hint)), hint);
        }
    }
}
