//! Mutation primitives shared by actions.
//!
//! Submodules:
//! - `retry`: optimistic-concurrency retry with exponential backoff
//! - `readiness`: bounded polling for asynchronous operator installs
//! - `subscription`: idempotent operator subscription creation
//! - `backup`: per-kind YAML backups written by prepare steps

pub mod backup;
pub mod readiness;
pub mod retry;
pub mod subscription;

pub use backup::{backup_kind, backup_path, read_backup};
pub use readiness::{poll_until, wait_for_install, Readiness};
pub use retry::{retry_on_conflict, update_with_retry, Updated};
pub use subscription::{ensure_subscription, find_subscription, Ensured, SubscriptionSpec};
