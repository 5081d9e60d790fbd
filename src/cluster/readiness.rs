use std::time::Duration;

use crate::adapters::{ClusterClient, Resource};
use crate::constants::{CSV_PHASE_FAILED, CSV_PHASE_SUCCEEDED};
use crate::policy::ReadinessPolicy;
use crate::types::errors::{Error, ErrorKind, Result};
use crate::types::Deadline;

/// One observation of a polled condition.
#[derive(Debug)]
pub enum Readiness<T> {
    Ready(T),
    /// Not ready yet; the message explains what is still missing.
    Pending(String),
    /// The condition can no longer become ready.
    Failed(Error),
}

/// Call `check` every `interval` until it is ready, bounded by `timeout` and by the parent
/// deadline.
///
/// Check errors count as "not ready yet" (an object that does not exist yet surfaces as
/// `NotFound`), except fatal client errors (`Forbidden`, `Invalid`), which abort the loop
/// immediately, as does [`Readiness::Failed`].
///
/// # Errors
/// `Timeout` naming `what` when the window closes or the deadline is cancelled, or the
/// aborting error.
pub fn poll_until<T>(
    deadline: &Deadline,
    interval: Duration,
    timeout: Duration,
    what: &str,
    mut check: impl FnMut(&Deadline) -> Result<Readiness<T>>,
) -> Result<T> {
    let window = deadline.narrowed(timeout);
    let mut last_pending = String::from("not observed yet");
    let timed_out = |e: Error, pending: &str| {
        Error::timeout(format!("waiting for {what}: {} ({pending})", e.msg))
    };
    loop {
        if let Err(e) = window.check() {
            return Err(timed_out(e, &last_pending));
        }
        match check(&window) {
            Ok(Readiness::Ready(v)) => return Ok(v),
            Ok(Readiness::Pending(msg)) => last_pending = msg,
            Ok(Readiness::Failed(e)) => return Err(e.context(&format!("waiting for {what}"))),
            Err(e) if e.is_timeout() => return Err(timed_out(e, &last_pending)),
            Err(e) if e.is_fatal_client() => {
                return Err(e.context(&format!("waiting for {what}")))
            }
            Err(e) => last_pending = e.to_string(),
        }
        if let Err(e) = window.sleep(interval) {
            return Err(timed_out(e, &last_pending));
        }
    }
}

/// Wait until the subscription's installed version reports phase `Succeeded`.
///
/// Existence of the subscription does not imply readiness: the subscription first has to
/// name an installed version, and that version then has to finish installing. A `Failed`
/// phase aborts the wait.
///
/// # Errors
/// `Timeout` when the install does not finish within `policy.timeout_ms`, `Cluster` when the
/// install failed, or any fatal client error.
pub fn wait_for_install(
    deadline: &Deadline,
    client: &dyn ClusterClient,
    policy: &ReadinessPolicy,
    namespace: &str,
    subscription: &str,
) -> Result<Resource> {
    let what = format!("operator subscription {namespace}/{subscription} to install");
    poll_until(deadline, policy.interval(), policy.timeout(), &what, |dl| {
        let sub = client.subscription(dl, namespace, subscription)?;
        let Some(csv_name) = sub.str_at("/status/installedCSV").map(str::to_string) else {
            return Ok(Readiness::Pending("subscription has no installed version yet".into()));
        };
        let csv = client.installed_version(dl, namespace, &csv_name)?;
        match csv.str_at("/status/phase") {
            Some(CSV_PHASE_SUCCEEDED) => Ok(Readiness::Ready(csv)),
            Some(CSV_PHASE_FAILED) => Ok(Readiness::Failed(Error::new(
                ErrorKind::Cluster,
                format!(
                    "{csv_name} failed to install: {}",
                    csv.str_at("/status/message").unwrap_or("no message")
                ),
            ))),
            phase => Ok(Readiness::Pending(format!(
                "{csv_name} is in phase {}",
                phase.unwrap_or("unknown")
            ))),
        }
    })
}
