use std::time::Duration;

use rand::Rng;

use crate::adapters::{ClusterClient, Resource, ResourceKind};
use crate::policy::RetryPolicy;
use crate::types::errors::{Error, ErrorKind, Result};
use crate::types::Deadline;

/// Result of a retried update.
#[derive(Clone, Debug)]
pub struct Updated {
    pub resource: Resource,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

fn jittered(base: Duration, jitter: f64) -> Duration {
    if jitter <= 0.0 || base.is_zero() {
        return base;
    }
    let extra = base.mul_f64(jitter.min(1.0) * rand::thread_rng().gen_range(0.0..1.0));
    base + extra
}

/// Run `op` until it succeeds, retrying only on `Conflict`.
///
/// At most `policy.steps` attempts are made, with an exponentially growing, jittered pause
/// between them. Any other error is returned immediately. Exhausting the attempts returns a
/// `Conflict` error naming the attempt count. Cancellation interrupts the pause with a
/// `Timeout` error.
///
/// # Errors
/// See above.
pub fn retry_on_conflict<T>(
    deadline: &Deadline,
    policy: &RetryPolicy,
    mut op: impl FnMut() -> Result<T>,
) -> Result<(T, u32)> {
    let steps = policy.steps.max(1);
    let mut last: Option<Error> = None;
    for attempt in 0..steps {
        if attempt > 0 {
            deadline.sleep(jittered(policy.base_delay(attempt - 1), policy.jitter))?;
        }
        deadline.check()?;
        match op() {
            Ok(v) => return Ok((v, attempt + 1)),
            Err(e) if e.is_conflict() => last = Some(e),
            Err(e) => return Err(e),
        }
    }
    let detail = last.map(|e| e.msg).unwrap_or_default();
    Err(Error::new(
        ErrorKind::Conflict,
        format!("giving up after {steps} conflicting attempts: {detail}"),
    ))
}

/// Read-modify-write `kind/namespace/name` with conflict retry. Every attempt re-reads the
/// object so `mutate` always sees the latest version.
///
/// # Errors
/// Errors from the read, from `mutate`, or from the update once retries are exhausted.
pub fn update_with_retry(
    deadline: &Deadline,
    client: &dyn ClusterClient,
    policy: &RetryPolicy,
    kind: &ResourceKind,
    namespace: Option<&str>,
    name: &str,
    mut mutate: impl FnMut(&mut Resource) -> Result<()>,
) -> Result<Updated> {
    let (resource, attempts) = retry_on_conflict(deadline, policy, || {
        let mut obj = client.get(deadline, kind, namespace, name)?;
        mutate(&mut obj)?;
        client.update(deadline, kind, &obj)
    })?;
    Ok(Updated { resource, attempts })
}
