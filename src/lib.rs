#![forbid(unsafe_code)]
//! Waypoint: upgrade-readiness checks and guarded migrations for a cluster-installed platform.
//!
//! Engine highlights:
//! - Rules live in explicitly constructed registries; nothing is registered process-wide.
//! - Checks run with per-rule isolation: one failing rule never stops the batch.
//! - Actions run strictly in order and halt on the first error or incomplete result.
//! - Every mutating sub-step honors dry-run and confirmation on its own, and records what it did
//!   (or would have done) into a step tree.

pub mod constants;
pub mod adapters;
pub mod api;
pub mod catalog;
pub mod cluster;
pub mod logging;
pub mod policy;
pub mod recorder;
pub mod registry;
pub mod render;
pub mod rules;
pub mod types;

pub use api::*;
