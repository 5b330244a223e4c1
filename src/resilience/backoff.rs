//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Pause schedule between retries: doubles per attempt, capped, with up to
/// 10% jitter on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub cap: Duration,
}

impl Backoff {
    pub fn from_millis(base_ms: u64, cap_ms: u64) -> Self {
        Self {
            base: Duration::from_millis(base_ms),
            cap: Duration::from_millis(cap_ms),
        }
    }

    /// Delay after the `attempt`-th failure (1-based). Attempt 0 waits nothing.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 2u32.saturating_pow(attempt - 1);
        let capped = self.base.saturating_mul(factor).min(self.cap);

        let jitter_range = capped.as_millis() as u64 / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        capped + Duration::from_millis(jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let backoff = Backoff::from_millis(100, 2000);
        assert_eq!(backoff.delay(0), Duration::ZERO);

        let first = backoff.delay(1);
        assert!(first >= Duration::from_millis(100) && first < Duration::from_millis(110));

        let second = backoff.delay(2);
        assert!(second >= Duration::from_millis(200) && second < Duration::from_millis(220));
    }

    #[test]
    fn test_backoff_capped() {
        let backoff = Backoff::from_millis(100, 1000);
        let late = backoff.delay(30);
        assert!(late >= Duration::from_millis(1000) && late < Duration::from_millis(1100));
    }

    #[test]
    fn test_zero_base() {
        let backoff = Backoff::from_millis(0, 0);
        assert_eq!(backoff.delay(5), Duration::ZERO);
    }
}
