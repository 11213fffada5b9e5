use std::time::Duration;

/// Fixed-interval attempt budget shared by both polling loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub attempts: u32,
}

impl PollSchedule {
    /// `ceil(timeout / interval)` attempts, never fewer than one
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        let interval_ms = interval.as_millis().max(1);
        let attempts = timeout.as_millis().div_ceil(interval_ms).max(1);

        Self {
            interval,
            attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
        }
    }

    pub fn is_last(&self, attempt: u32) -> bool {
        attempt >= self.attempts
    }

    /// Sleep between attempts; no-op after the final one
    pub async fn pause_after(&self, attempt: u32) {
        if !self.is_last(attempt) {
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_budget_matches_interval_multiples() {
        let schedule = PollSchedule::new(Duration::from_secs(600), Duration::from_secs(10));
        assert_eq!(schedule.attempts, 60);

        let schedule = PollSchedule::new(Duration::from_secs(20), Duration::from_secs(10));
        assert_eq!(schedule.attempts, 2);
    }

    #[test]
    fn test_budget_rounds_up_and_never_hits_zero() {
        let schedule = PollSchedule::new(Duration::from_secs(25), Duration::from_secs(10));
        assert_eq!(schedule.attempts, 3);

        let schedule = PollSchedule::new(Duration::from_secs(5), Duration::from_secs(10));
        assert_eq!(schedule.attempts, 1);

        let schedule = PollSchedule::new(Duration::ZERO, Duration::from_secs(10));
        assert_eq!(schedule.attempts, 1);
    }

    proptest! {
        #[test]
        fn prop_budget_is_ceiling_of_seconds(timeout_secs in 1u64..100_000) {
            let schedule = PollSchedule::new(
                Duration::from_secs(timeout_secs),
                Duration::from_secs(10),
            );
            prop_assert_eq!(u64::from(schedule.attempts), timeout_secs.div_ceil(10));
        }
    }
}
