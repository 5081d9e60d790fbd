use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TIMEOUT_MS;
use crate::types::errors::{Error, Result};

use super::types::{ReadinessPolicy, RetryPolicy, Thresholds};

/// Policy governs exit thresholds, conflict retry, readiness polling and the overall deadline.
///
/// Grouped fields provide clearer ownership and ergonomics. Every field has a default, so a
/// YAML file only needs to name what it changes:
///
/// ```yaml
/// thresholds:
///   fail_on_warning: true
/// retry:
///   steps: 8
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub thresholds: Thresholds,
    pub retry: RetryPolicy,
    pub readiness: ReadinessPolicy,
    /// Overall per-invocation deadline.
    pub timeout_ms: u64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            retry: RetryPolicy::default(),
            readiness: ReadinessPolicy::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Policy {
    /// Fail on Advisory conditions as well as Blocking ones.
    ///
    /// # Example
    /// ```rust
    /// use waypoint::policy::Policy;
    /// let p = Policy::strict_preset();
    /// assert!(p.thresholds.fail_on_warning);
    /// ```
    #[must_use]
    pub fn strict_preset() -> Self {
        let mut p = Self::default();
        p.thresholds.fail_on_critical = true;
        p.thresholds.fail_on_warning = true;
        p
    }

    /// Short retry and poll intervals for fixtures and tests.
    #[must_use]
    pub fn fast_preset() -> Self {
        let mut p = Self::default();
        p.retry.initial_delay_ms = 1;
        p.retry.max_delay_ms = 10;
        p.retry.jitter = 0.0;
        p.readiness.interval_ms = 1;
        p.readiness.timeout_ms = 2_000;
        p.timeout_ms = 30_000;
        p
    }

    /// Parse a policy document; absent fields keep their defaults.
    ///
    /// # Errors
    /// Returns `Invalid` when the document is not a valid policy.
    pub fn from_yaml(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(s).map_err(|e| Error::invalid(format!("parsing policy: {e}")))
    }

    /// Read and parse a policy file.
    ///
    /// # Errors
    /// Returns `Io` when the file cannot be read, `Invalid` when it does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading policy {}: {e}", path.display())))?;
        Self::from_yaml(&s)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
