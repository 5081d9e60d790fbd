//! Cancellable per-invocation deadline.
//!
//! One `Deadline` is derived from the caller's timeout and handed to every rule and every
//! cluster call. Clones share the cancellation flag, so cancelling any clone stops all
//! in-flight poll and retry loops at their next sleep or check.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::constants::SLEEP_SLICE_MS;

use super::errors::{Error, Result};

#[derive(Clone, Debug)]
pub struct Deadline {
    expires_at: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Deadline {
    /// A deadline that never expires on its own; it can still be cancelled.
    #[must_use]
    pub fn none() -> Self {
        Self {
            expires_at: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(timeout),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A child deadline bounded by both `self` and `timeout`, sharing cancellation.
    #[must_use]
    pub fn narrowed(&self, timeout: Duration) -> Self {
        let candidate = Instant::now().checked_add(timeout);
        let expires_at = match (self.expires_at, candidate) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            expires_at,
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|t| Instant::now() >= t)
    }

    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|t| t.saturating_duration_since(Instant::now()))
    }

    /// # Errors
    /// Returns a `Timeout` error once the deadline has expired or was cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::timeout("operation cancelled"));
        }
        if self.is_expired() {
            return Err(Error::timeout("deadline exceeded"));
        }
        Ok(())
    }

    /// Sleep for `d`, waking early on cancellation or expiry.
    ///
    /// # Errors
    /// Returns a `Timeout` error when the deadline fires before `d` has elapsed.
    pub fn sleep(&self, d: Duration) -> Result<()> {
        let wake_at = Instant::now() + d;
        loop {
            self.check()?;
            let now = Instant::now();
            if now >= wake_at {
                return Ok(());
            }
            let mut slice = (wake_at - now).min(Duration::from_millis(SLEEP_SLICE_MS));
            if let Some(rem) = self.remaining() {
                slice = slice.min(rem);
            }
            thread::sleep(slice);
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}
