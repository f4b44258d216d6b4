//! Sleep sizing between quiescence polls.

use std::{num::NonZeroU64, time::Duration};

use crate::query::ConfigError;

/// Default lower bound on the sleep between polls, in seconds.
pub const DEFAULT_MIN_SLEEP_SECS: u64 = 10;
/// Default upper bound on the sleep between polls, in seconds.
pub const DEFAULT_MAX_SLEEP_SECS: u64 = 300;
/// Default number of notifications one worker is assumed to drain per second.
pub const DEFAULT_PER_WORKER_RATE: NonZeroU64 = match NonZeroU64::new(100) {
    Some(rate) => rate,
    None => unreachable!(),
};

/// Scales the poll interval with the outstanding backlog.
///
/// The raw estimate is `outstanding / workers / per_worker_rate`, clamped to
/// `[min_sleep, max_sleep]` seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    min_sleep_secs: u64,
    max_sleep_secs: u64,
    per_worker_rate: NonZeroU64,
}

impl BackoffPolicy {
    /// Policy with explicit bounds and rate divisor.
    pub fn new(
        min_sleep_secs: u64,
        max_sleep_secs: u64,
        per_worker_rate: NonZeroU64,
    ) -> Result<Self, ConfigError> {
        if min_sleep_secs > max_sleep_secs {
            return Err(ConfigError::InvalidBackoff {
                min: min_sleep_secs,
                max: max_sleep_secs,
            });
        }
        Ok(Self {
            min_sleep_secs,
            max_sleep_secs,
            per_worker_rate,
        })
    }

    /// Lower sleep bound in seconds.
    pub fn min_sleep_secs(&self) -> u64 {
        self.min_sleep_secs
    }

    /// Upper sleep bound in seconds.
    pub fn max_sleep_secs(&self) -> u64 {
        self.max_sleep_secs
    }

    /// Assumed notifications drained per worker per second.
    pub fn per_worker_rate(&self) -> NonZeroU64 {
        self.per_worker_rate
    }

    /// Seconds to wait before the next poll.
    pub fn next_sleep_secs(&self, outstanding: u64, workers: NonZeroU64) -> u64 {
        let estimate = outstanding / workers.get() / self.per_worker_rate.get();
        estimate.clamp(self.min_sleep_secs, self.max_sleep_secs)
    }

    /// [`Self::next_sleep_secs`] as a [`Duration`].
    pub fn next_sleep(&self, outstanding: u64, workers: NonZeroU64) -> Duration {
        Duration::from_secs(self.next_sleep_secs(outstanding, workers))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            min_sleep_secs: DEFAULT_MIN_SLEEP_SECS,
            max_sleep_secs: DEFAULT_MAX_SLEEP_SECS,
            per_worker_rate: DEFAULT_PER_WORKER_RATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use super::BackoffPolicy;
    use crate::query::ConfigError;

    fn workers(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    #[test]
    fn default_bounds() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.next_sleep_secs(0, workers(1)), 10);
        assert_eq!(policy.next_sleep_secs(100_000, workers(1)), 300);
        assert_eq!(policy.next_sleep_secs(4, workers(1)), 10);
    }

    #[test]
    fn scales_with_backlog_and_workers() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.next_sleep_secs(5_000, workers(1)), 50);
        assert_eq!(policy.next_sleep_secs(5_000, workers(2)), 25);
        assert_eq!(policy.next_sleep_secs(5_000, workers(5)), 10);
        assert_eq!(policy.next_sleep_secs(29_999, workers(1)), 299);
    }

    #[test]
    fn monotonic_and_bounded() {
        let policy = BackoffPolicy::default();
        for _ in 0..1_000 {
            let w = workers(fastrand::u64(1..=64));
            let a = fastrand::u64(0..10_000_000);
            let b = a + fastrand::u64(0..1_000_000);
            let sa = policy.next_sleep_secs(a, w);
            let sb = policy.next_sleep_secs(b, w);
            assert!(sa <= sb, "not monotonic: {a}->{sa}, {b}->{sb} with {w} workers");
            assert!((10..=300).contains(&sa));
            assert!((10..=300).contains(&sb));
        }
        assert_eq!(policy.next_sleep_secs(u64::MAX, workers(1)), 300);
    }

    #[test]
    fn custom_bounds() {
        let policy = BackoffPolicy::new(1, 5, NonZeroU64::new(10).unwrap()).unwrap();
        assert_eq!(policy.next_sleep_secs(0, workers(1)), 1);
        assert_eq!(policy.next_sleep_secs(30, workers(1)), 3);
        assert_eq!(policy.next_sleep_secs(1_000, workers(1)), 5);

        let fixed = BackoffPolicy::new(7, 7, NonZeroU64::new(1).unwrap()).unwrap();
        assert_eq!(fixed.next_sleep_secs(1_000, workers(3)), 7);
    }

    #[test]
    fn rejects_inverted_bounds() {
        assert_eq!(
            BackoffPolicy::new(30, 10, NonZeroU64::new(100).unwrap()),
            Err(ConfigError::InvalidBackoff { min: 30, max: 10 })
        );
    }
}
