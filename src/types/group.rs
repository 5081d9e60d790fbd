//! Closed sets of rule categories.
use std::fmt;

use serde::{Deserialize, Serialize};

/// A rule category usable in selectors.
pub trait Group: Copy + Eq + Ord + fmt::Debug + Send + Sync + 'static {
    /// Every variant, in canonical order.
    const ALL: &'static [Self];

    /// Singular lowercase name (`component`).
    fn as_str(self) -> &'static str;

    /// Plural selector name (`components`).
    fn selector_name(self) -> &'static str;

    /// Resolve a selector token; accepts singular and plural spellings.
    fn from_selector(token: &str) -> Option<Self> {
        let t = token.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == t || g.selector_name() == t)
    }
}

/// Check categories. Declaration order is the canonical rendering order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckGroup {
    Dependency,
    Service,
    Component,
    Workload,
}

impl Group for CheckGroup {
    const ALL: &'static [Self] = &[
        CheckGroup::Dependency,
        CheckGroup::Service,
        CheckGroup::Component,
        CheckGroup::Workload,
    ];

    fn as_str(self) -> &'static str {
        match self {
            CheckGroup::Dependency => "dependency",
            CheckGroup::Service => "service",
            CheckGroup::Component => "component",
            CheckGroup::Workload => "workload",
        }
    }

    fn selector_name(self) -> &'static str {
        match self {
            CheckGroup::Dependency => "dependencies",
            CheckGroup::Service => "services",
            CheckGroup::Component => "components",
            CheckGroup::Workload => "workloads",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionGroup {
    Migration,
    Backup,
    Validation,
}

impl Group for ActionGroup {
    const ALL: &'static [Self] = &[
        ActionGroup::Migration,
        ActionGroup::Backup,
        ActionGroup::Validation,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ActionGroup::Migration => "migration",
            ActionGroup::Backup => "backup",
            ActionGroup::Validation => "validation",
        }
    }

    fn selector_name(self) -> &'static str {
        match self {
            ActionGroup::Migration => "migrations",
            ActionGroup::Backup => "backups",
            ActionGroup::Validation => "validations",
        }
    }
}

impl fmt::Display for CheckGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ActionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
