// Adaptive polling policy
use super::constants::{
    FAST_POLL_INTERVAL, GENERATION_DEADLINE, SLOW_POLL_INTERVAL, SLOW_POLL_THRESHOLD,
};
use std::time::Duration;

/// Decides how long to wait between status checks and when to give up
///
/// Young jobs are polled every `fast_interval`; once a job has been
/// polling for `slow_after` it drops to `slow_interval` to cut call volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub fast_interval: Duration,
    pub slow_interval: Duration,
    pub slow_after: Duration,
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            fast_interval: FAST_POLL_INTERVAL,
            slow_interval: SLOW_POLL_INTERVAL,
            slow_after: SLOW_POLL_THRESHOLD,
            deadline: GENERATION_DEADLINE,
        }
    }
}

impl PollPolicy {
    /// Sleep before the next status check
    pub fn interval_for(&self, elapsed: Duration) -> Duration {
        if elapsed < self.slow_after {
            self.fast_interval
        } else {
            self.slow_interval
        }
    }

    /// True once the hard deadline has been reached
    pub fn is_expired(&self, elapsed: Duration) -> bool {
        elapsed >= self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_interval_before_threshold() {
        let policy = PollPolicy::default();
        for secs in [0, 1, 5, 29] {
            assert_eq!(
                policy.interval_for(Duration::from_secs(secs)),
                Duration::from_secs(5)
            );
        }
        assert_eq!(
            policy.interval_for(Duration::from_millis(29_999)),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_slow_interval_from_threshold() {
        let policy = PollPolicy::default();
        for secs in [30, 31, 120, 299, 300] {
            assert_eq!(
                policy.interval_for(Duration::from_secs(secs)),
                Duration::from_secs(10)
            );
        }
    }

    #[test]
    fn test_deadline_boundary() {
        let policy = PollPolicy::default();
        assert!(!policy.is_expired(Duration::from_millis(299_999)));
        assert!(policy.is_expired(Duration::from_secs(300)));
        assert!(policy.is_expired(Duration::from_secs(301)));
    }
}
