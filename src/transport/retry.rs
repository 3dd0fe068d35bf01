//! Backoff configuration and retriability rules.

use std::time::Duration;

use http::{Method, StatusCode};

/// Configuration for exponential backoff between retries.
///
/// The delay before retry `n` (0-indexed) is `min_delay * factor^n`,
/// capped at `max_delay`. With jitter enabled, the delay is drawn
/// uniformly from `[min_delay, delay]`.
///
/// A policy is shared configuration only. Each logical call obtains its
/// own counter via [`BackoffPolicy::start`].
///
/// # Defaults
///
/// - `min_delay`: 100 milliseconds
/// - `max_delay`: 10 seconds
/// - `factor`: 2.0
/// - `jitter`: enabled
/// - `max_attempts`: none (retry until success, a terminal status, or cancellation)
///
/// # Example
///
/// ```
/// use sanity_client::transport::BackoffPolicy;
/// use std::time::Duration;
///
/// let policy = BackoffPolicy::new()
///     .with_min_delay(Duration::from_millis(250))
///     .with_max_delay(Duration::from_secs(5))
///     .with_factor(1.5)
///     .with_jitter(false)
///     .with_max_attempts(8);
///
/// assert_eq!(policy.delay_for_retry(0), Duration::from_millis(250));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub min_delay: Duration,

    /// Upper bound for any single delay.
    pub max_delay: Duration,

    /// Multiplier applied per retry.
    pub factor: f64,

    /// Whether delays are randomized.
    pub jitter: bool,

    /// Maximum number of attempts including the first, if capped.
    pub max_attempts: Option<u32>,
}

impl BackoffPolicy {
    /// Default minimum delay (100 milliseconds).
    pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(100);

    /// Default maximum delay (10 seconds).
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

    /// Default factor (2.0).
    pub const DEFAULT_FACTOR: f64 = 2.0;

    /// Creates a policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min_delay: Self::DEFAULT_MIN_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            factor: Self::DEFAULT_FACTOR,
            jitter: true,
            max_attempts: None,
        }
    }

    /// Sets the delay before the first retry.
    ///
    /// Zero is allowed but produces a tight retry loop.
    #[must_use]
    pub const fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff factor.
    ///
    /// # Panics
    ///
    /// Panics if `factor` is not a positive finite number.
    #[must_use]
    pub fn with_factor(mut self, factor: f64) -> Self {
        assert!(
            factor > 0.0 && factor.is_finite(),
            "factor must be positive"
        );
        self.factor = factor;
        self
    }

    /// Enables or disables jitter.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Caps the number of attempts (including the first one).
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is 0.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        assert!(max_attempts >= 1, "max_attempts must be at least 1");
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Computes the un-jittered delay for a given retry number (0-indexed).
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let min = self.min_delay.as_secs_f64();
        let max = self.max_delay.as_secs_f64();
        let delay = (min * self.factor.powi(exponent)).min(max);

        // `min > max`, overflow and caps beyond `Duration` range collapse to the cap
        if delay.is_finite() && delay >= 0.0 {
            Duration::try_from_secs_f64(delay).unwrap_or(self.max_delay)
        } else {
            self.max_delay
        }
    }

    /// Starts a fresh backoff counter for one logical call.
    #[must_use]
    pub fn start(&self) -> Backoff<'_> {
        Backoff {
            policy: self,
            attempts: 1,
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-call backoff state.
#[derive(Debug)]
pub struct Backoff<'a> {
    policy: &'a BackoffPolicy,
    attempts: u32,
}

impl Backoff<'_> {
    /// Number of attempts made so far (starts at 1).
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the delay before the next attempt and counts that attempt.
    ///
    /// Returns `None` once the policy's attempt cap has been reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self
            .policy
            .max_attempts
            .is_some_and(|max| self.attempts >= max)
        {
            return None;
        }

        let delay = self.policy.delay_for_retry(self.attempts - 1);
        self.attempts = self.attempts.saturating_add(1);

        if !self.policy.jitter || delay <= self.policy.min_delay {
            return Some(delay);
        }

        let min = self.policy.min_delay.as_secs_f64();
        let spread = delay.as_secs_f64() - min;
        let jittered = rand::random::<f64>().mul_add(spread, min);
        Some(Duration::try_from_secs_f64(jittered).unwrap_or(delay))
    }
}

/// Returns true for methods that are safe to repeat automatically.
#[must_use]
pub fn is_method_retriable(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::DELETE | Method::OPTIONS
    )
}

/// Returns true for statuses that indicate a transient server condition.
#[must_use]
pub fn is_status_retriable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT
    )
}
