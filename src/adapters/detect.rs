//! Current-version detection.
use crate::types::errors::{Error, Result};
use crate::types::{Deadline, Version};

use super::ClusterClient;

pub trait VersionDetector: Send + Sync {
    /// Detect the installed platform version.
    ///
    /// # Errors
    /// Returns an error when no version can be read from the cluster.
    fn detect(&self, deadline: &Deadline, client: &dyn ClusterClient) -> Result<Version>;
}

/// Reads `status.release.version` from the primary configuration object, falling back to
/// the initialization object when the former is absent or has not reported yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReleaseStatusDetector;

const RELEASE_POINTER: &str = "/status/release/version";

impl VersionDetector for ReleaseStatusDetector {
    fn detect(&self, deadline: &Deadline, client: &dyn ClusterClient) -> Result<Version> {
        let primary = match client.primary_config(deadline) {
            Ok(r) => r.str_at(RELEASE_POINTER).map(str::to_string),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };
        let raw = match primary {
            Some(v) => v,
            None => client
                .initialization(deadline)?
                .str_at(RELEASE_POINTER)
                .map(str::to_string)
                .ok_or_else(|| Error::not_found("no release version reported in cluster status"))?,
        };
        Version::parse(&raw)
    }
}

/// Always reports the same version. Used when the caller overrides detection.
#[derive(Debug, Clone)]
pub struct FixedVersion(pub Version);

impl VersionDetector for FixedVersion {
    fn detect(&self, _deadline: &Deadline, _client: &dyn ClusterClient) -> Result<Version> {
        Ok(self.0.clone())
    }
}
