//! Parsed, ordered platform versions.
//!
//! Release strings reported by clusters are looser than strict semver: they may carry a
//! leading `v` and often omit the patch component. Both forms normalize to a full
//! `major.minor.patch` value so gates can compare them directly.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(semver::Version);

impl Version {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Parse `2.25.0`, `v2.25.0`, `2.25` or `3`.
    ///
    /// # Errors
    /// Returns an `Invalid` error for anything else.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let s = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if s.is_empty() {
            return Err(Error::invalid("empty version string"));
        }
        let (core, rest) = match s.find(['-', '+']) {
            Some(i) => s.split_at(i),
            None => (s, ""),
        };
        let dots = core.matches('.').count();
        let padded = match dots {
            0 => format!("{core}.0.0{rest}"),
            1 => format!("{core}.0{rest}"),
            _ => s.to_string(),
        };
        semver::Version::parse(&padded)
            .map(Self)
            .map_err(|e| Error::invalid(format!("invalid version `{raw}`: {e}")))
    }

    #[must_use]
    pub fn major(&self) -> u64 {
        self.0.major
    }

    #[must_use]
    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    /// True when `self >= major.minor.0`.
    #[must_use]
    pub fn at_least(&self, major: u64, minor: u64) -> bool {
        (self.0.major, self.0.minor) >= (major, minor)
    }

    /// True when `self < major.minor.0`, ignoring pre-release tags.
    #[must_use]
    pub fn below(&self, major: u64, minor: u64) -> bool {
        !self.at_least(major, minor)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
