//! Declarative version gates.
use crate::types::Version;

/// Half-open `[min, below)` range; either bound may be absent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VersionRange {
    min: Option<(u64, u64)>,
    below: Option<(u64, u64)>,
}

impl VersionRange {
    #[must_use]
    pub const fn any() -> Self {
        Self {
            min: None,
            below: None,
        }
    }

    #[must_use]
    pub const fn at_least(major: u64, minor: u64) -> Self {
        Self {
            min: Some((major, minor)),
            below: None,
        }
    }

    #[must_use]
    pub const fn below(major: u64, minor: u64) -> Self {
        Self {
            min: None,
            below: Some((major, minor)),
        }
    }

    #[must_use]
    pub const fn between(min: (u64, u64), below: (u64, u64)) -> Self {
        Self {
            min: Some(min),
            below: Some(below),
        }
    }

    #[must_use]
    pub fn contains(&self, v: &Version) -> bool {
        self.min.map_or(true, |(maj, min)| v.at_least(maj, min))
            && self.below.map_or(true, |(maj, min)| v.below(maj, min))
    }
}

/// Applicability window over the (current, target) pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Gate {
    pub current: VersionRange,
    pub target: VersionRange,
}

impl Gate {
    #[must_use]
    pub const fn always() -> Self {
        Self {
            current: VersionRange::any(),
            target: VersionRange::any(),
        }
    }

    /// Upgrades crossing into `major.minor`: `current < major.minor <= target`.
    #[must_use]
    pub const fn crossing(major: u64, minor: u64) -> Self {
        Self {
            current: VersionRange::below(major, minor),
            target: VersionRange::at_least(major, minor),
        }
    }

    #[must_use]
    pub const fn current_in(range: VersionRange) -> Self {
        Self {
            current: range,
            target: VersionRange::any(),
        }
    }

    #[must_use]
    pub const fn target_in(range: VersionRange) -> Self {
        Self {
            current: VersionRange::any(),
            target: range,
        }
    }

    #[must_use]
    pub fn allows(&self, current: &Version, target: &Version) -> bool {
        self.current.contains(current) && self.target.contains(target)
    }
}
