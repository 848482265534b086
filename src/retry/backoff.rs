//! # Jittered exponential backoff policy.
//!
//! [`BackoffPolicy`] fixes the parameters of a randomized exponential backoff
//! loop:
//! - [`initial_delay`](BackoffPolicy::initial_delay) the first base delay;
//! - [`maximum_delay`](BackoffPolicy::maximum_delay) the hard delay ceiling;
//! - [`timeout`](BackoffPolicy::timeout) an optional wall-clock budget for a
//!   whole run (`None` retries indefinitely);
//! - [`factor`](BackoffPolicy::factor) the multiplicative growth factor.
//!
//! The delay for round `n` is drawn uniformly from `[0, 2 × base_n)` and
//! clamped to the ceiling, with `base_0 = initial_delay` and
//! `base_{n+1} = base_n × factor`. When a timeout is set, the final delay is
//! additionally shortened so the next attempt never starts past the
//! deadline.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::check::{ensure_greater_or_equal, ensure_greater_than, ArgumentError};

use super::retry::RetryError;

/// Parameters of a randomized exponential backoff run.
///
/// All constraints are validated at construction; a policy value is
/// immutable afterwards.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use groundwork::BackoffPolicy;
///
/// let policy = BackoffPolicy::new(
///     Duration::from_millis(100),
///     Duration::from_secs(10),
///     Some(Duration::from_secs(60)),
///     2.0,
/// )
/// .unwrap();
/// assert_eq!(policy.factor(), 2.0);
///
/// // Constraint violations are rejected up front.
/// assert!(BackoffPolicy::new(Duration::ZERO, Duration::from_secs(1), None, 2.0).is_err());
/// ```
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    initial_delay: Duration,
    maximum_delay: Duration,
    timeout: Option<Duration>,
    factor: f64,
}

impl Default for BackoffPolicy {
    /// Returns a policy with:
    /// - `initial_delay = 2s`;
    /// - `maximum_delay = 60s`;
    /// - `timeout = 5min`;
    /// - `factor = 2.0`.
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            maximum_delay: Duration::from_secs(60),
            timeout: Some(Duration::from_secs(60 * 5)),
            factor: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy from explicit parameters.
    ///
    /// ### Parameters
    /// - `initial_delay`: first base delay, MUST be greater than zero.
    /// - `maximum_delay`: delay ceiling, MUST be at least `initial_delay`.
    /// - `timeout`: wall-clock budget per run; `None` retries indefinitely.
    /// - `factor`: growth factor, MUST be greater than zero.
    pub fn new(
        initial_delay: Duration,
        maximum_delay: Duration,
        timeout: Option<Duration>,
        factor: f64,
    ) -> Result<Self, ArgumentError> {
        ensure_greater_than(
            initial_delay,
            Duration::ZERO,
            "'initial_delay' MUST be greater than zero.",
        )?;
        ensure_greater_or_equal(
            maximum_delay,
            initial_delay,
            "'maximum_delay' MUST be greater than or equal to 'initial_delay'.",
        )?;
        ensure_greater_than(factor, 0.0, "'factor' MUST be greater than zero.")?;
        Ok(Self {
            initial_delay,
            maximum_delay,
            timeout,
            factor,
        })
    }

    /// Returns the first base delay.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Returns the delay ceiling.
    pub fn maximum_delay(&self) -> Duration {
        self.maximum_delay
    }

    /// Returns the wall-clock budget for one run, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the multiplicative growth factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Runs `op` under this policy until it succeeds, `predicate` rejects a
    /// failure, or the deadline elapses.
    ///
    /// The deadline is computed once per call, so separate runs through the
    /// same policy each get the full budget.
    pub(crate) fn run<T, E, P, F>(&self, predicate: P, mut op: F) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + 'static,
        P: Fn(&E) -> bool,
        F: FnMut() -> Result<T, E>,
    {
        let deadline = self.timeout.map(|timeout| (Instant::now() + timeout, timeout));
        let mut base = self.initial_delay.as_secs_f64();

        loop {
            let failure = match op() {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };
            if !predicate(&failure) {
                return Err(RetryError::Rejected(failure));
            }

            let mut delay = self.draw_delay(base);
            if let Some((deadline, timeout)) = deadline {
                let now = Instant::now();
                if now > deadline {
                    return Err(RetryError::Exhausted {
                        timeout,
                        cause: failure,
                    });
                }
                delay = delay.min(deadline - now);
            }

            log::warn!("retrying after failure: {failure}; waiting {delay:?} before the next attempt");
            std::thread::sleep(delay);
            base *= self.factor;
        }
    }

    /// Draws one jittered delay for the given base, clamped to the ceiling.
    fn draw_delay(&self, base_secs: f64) -> Duration {
        let max_secs = self.maximum_delay.as_secs_f64();
        let upper = base_secs * 2.0;
        if !upper.is_finite() {
            return self.maximum_delay;
        }
        if upper <= 0.0 {
            return Duration::ZERO;
        }
        let drawn = rand::rng().random_range(0.0..upper);
        Duration::from_secs_f64(drawn.min(max_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_initial_delay_is_rejected() {
        let result = BackoffPolicy::new(Duration::ZERO, Duration::from_secs(1), None, 2.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_maximum_below_initial_is_rejected() {
        let result = BackoffPolicy::new(
            Duration::from_secs(10),
            Duration::from_secs(5),
            None,
            2.0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_non_positive_factor_is_rejected() {
        let result = BackoffPolicy::new(
            Duration::from_millis(1),
            Duration::from_millis(2),
            None,
            0.0,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_maximum_equal_to_initial_is_allowed() {
        let policy = BackoffPolicy::new(
            Duration::from_secs(1),
            Duration::from_secs(1),
            None,
            1.0,
        );
        assert!(policy.is_ok());
    }

    #[test]
    fn test_draw_stays_below_twice_base() {
        let policy = BackoffPolicy::new(
            Duration::from_millis(100),
            Duration::from_secs(30),
            None,
            2.0,
        )
        .unwrap();

        for _ in 0..200 {
            let delay = policy.draw_delay(0.1);
            assert!(
                delay < Duration::from_millis(200),
                "delay {delay:?} escaped the [0, 2 x base) window"
            );
        }
    }

    #[test]
    fn test_draw_is_clamped_to_maximum() {
        let policy = BackoffPolicy::new(
            Duration::from_millis(100),
            Duration::from_millis(150),
            None,
            2.0,
        )
        .unwrap();

        for _ in 0..200 {
            let delay = policy.draw_delay(10.0);
            assert!(
                delay <= Duration::from_millis(150),
                "delay {delay:?} exceeds the ceiling"
            );
        }
    }

    #[test]
    fn test_defaults() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.initial_delay(), Duration::from_secs(2));
        assert_eq!(policy.maximum_delay(), Duration::from_secs(60));
        assert_eq!(policy.timeout(), Some(Duration::from_secs(300)));
        assert_eq!(policy.factor(), 2.0);
    }
}
