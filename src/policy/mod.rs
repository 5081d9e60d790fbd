//! Run configuration.
//!
//! The `policy` module groups the knobs consumed by the check executor and the action
//! orchestrator. Consumers construct a [`Policy`](crate::policy::Policy) via `Default` or a
//! preset (`strict_preset`, `fast_preset`), optionally overlay a YAML file with
//! [`Policy::from_yaml`], and then customize fields before creating a
//! [`Waypoint`](crate::Waypoint) instance.
//!
//! Submodules:
//! - `config`: policy struct, presets and YAML loading
//! - `types`: grouped sub-structs

pub mod config;
pub mod types;

pub use config::Policy;
pub use types::{ReadinessPolicy, RetryPolicy, Thresholds};
