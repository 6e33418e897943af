use rand::Rng;
use std::time::Duration;

/// How hard the balance guard tries before giving up on a contended wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total read-validate-write attempts, including the first one.
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    /// Upper bound on the time one call may spend retrying.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 32,
            base_backoff: Duration::from_millis(2),
            max_backoff: Duration::from_millis(100),
            deadline: None,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries; the first conflict is reported.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Upper edge of the backoff window after `attempt` failed attempts.
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_backoff
            .saturating_mul(1 << exponent)
            .min(self.max_backoff)
    }

    /// Sleep before the next attempt: uniformly drawn from the upper half of
    /// the ceiling so that colliding writers spread out.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let ceiling = self.backoff_ceiling(attempt);
        let half = ceiling / 2;
        if half.is_zero() {
            return ceiling;
        }
        let window = u64::try_from(half.as_micros()).unwrap_or(u64::MAX);
        let jitter = rand::thread_rng().gen_range(0..=window);
        half + Duration::from_micros(jitter)
    }
}
