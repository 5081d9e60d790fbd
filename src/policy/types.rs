use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    READINESS_INTERVAL_MS, READINESS_TIMEOUT_MS, RETRY_FACTOR, RETRY_INITIAL_DELAY_MS,
    RETRY_JITTER, RETRY_MAX_DELAY_MS, RETRY_STEPS,
};

/// Which impacts turn a lint run into a non-zero exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Blocking conditions fail the run.
    pub fail_on_critical: bool,
    /// Advisory conditions fail the run.
    pub fail_on_warning: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fail_on_critical: true,
            fail_on_warning: false,
        }
    }
}

/// Exponential backoff for optimistic-concurrency conflicts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub initial_delay_ms: u64,
    pub factor: f64,
    /// Fraction of each delay added as random jitter, in `[0, 1]`.
    pub jitter: f64,
    /// Total attempts, including the first.
    pub steps: u32,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: RETRY_INITIAL_DELAY_MS,
            factor: RETRY_FACTOR,
            jitter: RETRY_JITTER,
            steps: RETRY_STEPS,
            max_delay_ms: RETRY_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Base delay before attempt `n + 1` (zero-based `n`), without jitter,
    /// capped at `max_delay_ms`.
    #[must_use]
    pub fn base_delay(&self, n: u32) -> Duration {
        let exp = i32::try_from(n).unwrap_or(i32::MAX);
        #[allow(clippy::cast_precision_loss, reason = "delays are small")]
        let raw = self.initial_delay_ms as f64 * self.factor.max(1.0).powi(exp);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss,
            reason = "clamped to max_delay_ms before the cast"
        )]
        let ms = raw.min(self.max_delay_ms as f64).max(0.0) as u64;
        Duration::from_millis(ms)
    }
}

/// Fixed-interval poll for asynchronous installs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessPolicy {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            interval_ms: READINESS_INTERVAL_MS,
            timeout_ms: READINESS_TIMEOUT_MS,
        }
    }
}

impl ReadinessPolicy {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
