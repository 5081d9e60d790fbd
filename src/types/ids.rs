//! Run identifiers.
//!
//! The UUID namespace is derived from a stable tag (`NS_TAG`) so that a `run_id` is
//! reproducible across runs for the same requested rules and version pair. Dry-run facts
//! rely on this to diff cleanly.
use uuid::Uuid;

use super::version::Version;
use crate::constants::NS_TAG;

fn namespace() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, NS_TAG.as_bytes())
}

/// Deterministic UUIDv5 over the requested rule ids (in request order) and the version pair.
#[must_use]
pub fn run_id<S: AsRef<str>>(rule_ids: &[S], current: &Version, target: &Version) -> Uuid {
    let mut s = format!("{current}->{target}\n");
    for id in rule_ids {
        s.push_str(id.as_ref());
        s.push('\n');
    }
    Uuid::new_v5(&namespace(), s.as_bytes())
}
