//! Shared crate-wide constants for waypoint.
//!
//! Centralizes magic values and default knobs used across modules.
//! Adjusting these here will propagate through the crate.

/// UUIDv5 namespace tag for deterministic run identifiers.
pub const NS_TAG: &str = "https://waypoint.dev/runs";

/// Subsystem label stamped on every emitted fact.
pub const FACTS_SUBSYSTEM: &str = "waypoint";

/// Default overall per-invocation deadline.
pub const DEFAULT_TIMEOUT_MS: u64 = 600_000;

/// Conflict-retry defaults for updates to frequently reconciled objects.
pub const RETRY_INITIAL_DELAY_MS: u64 = 100;
pub const RETRY_FACTOR: f64 = 2.0;
pub const RETRY_JITTER: f64 = 0.1;
pub const RETRY_STEPS: u32 = 5;
pub const RETRY_MAX_DELAY_MS: u64 = 5_000;

/// Readiness poll defaults for operator installs.
pub const READINESS_INTERVAL_MS: u64 = 2_000;
pub const READINESS_TIMEOUT_MS: u64 = 300_000;

/// Granularity used by `Deadline::sleep` to notice cancellation.
pub const SLEEP_SLICE_MS: u64 = 20;

/// Phase reported by an installed operator version once it is ready.
pub const CSV_PHASE_SUCCEEDED: &str = "Succeeded";

/// Phase reported by an installed operator version that will not recover.
pub const CSV_PHASE_FAILED: &str = "Failed";

/// Annotation used to preserve configuration overwritten by a migration.
pub const PRESERVED_CONFIG_ANNOTATION: &str = "waypoint.dev/preserved-config";

/// Default directory for backups written by prepare/backup steps.
pub const DEFAULT_OUTPUT_DIR: &str = "waypoint-backup";
