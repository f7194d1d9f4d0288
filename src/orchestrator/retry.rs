//! Retry policy for the catalog shard-list fetch.
//!
//! Losing the shard list is fatal to a run, so transient failures get a few
//! spaced-out retries before the orchestrator gives up (or switches to the
//! configured degraded list).

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

use crate::catalog::CatalogError;

/// Default attempts for the shard-list fetch, including the first.
pub const DEFAULT_CATALOG_ATTEMPTS: u32 = 3;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(16);

const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;

/// Upper bound on jitter; the effective bound is also at most half the delay.
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Classification of a catalog failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Network trouble or a 5xx; may succeed on retry.
    Transient,
    /// Server asked us to slow down (429).
    RateLimited,
    /// Malformed document or a 4xx; retrying will not help.
    Permanent,
}

/// Decision on whether to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after `delay`; `attempt` is the 1-based number of the next try.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be.
        attempt: u32,
    },
    /// Give up.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Exponential backoff with jitter.
///
/// ```text
/// delay = min(base_delay * multiplier^(attempt - 1), max_delay) + jitter
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_CATALOG_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with custom settings; `max_attempts` is clamped to 1.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f32,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Default delays with a custom attempt count.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides what to do after attempt number `attempt` failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * f64::from(self.backoff_multiplier).powf(exponent);
        let capped = Duration::from_millis(delay_ms.min(self.max_delay.as_millis() as f64) as u64);
        capped + Self::jitter(capped)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn jitter(delay: Duration) -> Duration {
        let bound = MAX_JITTER.min(delay / 2).as_millis() as u64;
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=bound))
    }
}

/// Classifies a catalog error for retry decisions.
#[must_use]
pub fn classify_catalog_error(error: &CatalogError) -> FailureType {
    match error {
        CatalogError::HttpStatus { status: 429, .. } => FailureType::RateLimited,
        other if other.is_transient() => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}
