//! Action output: the recorded step tree of one prepare or execute phase.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::group::ActionGroup;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl StepStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Failed | StepStatus::Skipped
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "Pending",
            StepStatus::Running => "Running",
            StepStatus::Completed => "Completed",
            StepStatus::Failed => "Failed",
            StepStatus::Skipped => "Skipped",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ActionStep>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

impl ActionStep {
    /// True if this step or any descendant failed.
    #[must_use]
    pub fn any_failed(&self) -> bool {
        self.status == StepStatus::Failed || self.children.iter().any(ActionStep::any_failed)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionMetadata {
    pub group: ActionGroup,
    pub kind: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub description: String,
    pub dry_run: bool,
}

/// One recorder event: a step was opened, or it reached its terminal status.
///
/// `path` indexes into `ActionStatus::steps`, then into each level's `children`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepEvent {
    pub path: Vec<usize>,
    pub closed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionStatus {
    pub steps: Vec<ActionStep>,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Open/close order of the steps as they were recorded. Sibling steps may overlap, so
    /// this order is not always the tree's pre-order. Empty for deserialized results.
    #[serde(skip)]
    pub transcript: Vec<StepEvent>,
}

impl ActionStatus {
    /// The step at `path`, if any.
    #[must_use]
    pub fn step_at(&self, path: &[usize]) -> Option<&ActionStep> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.steps.get(*first)?, |s, &i| s.children.get(i))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub metadata: ActionMetadata,
    pub spec: ActionSpec,
    pub status: ActionStatus,
}

impl ActionResult {
    #[must_use]
    pub fn any_failed(&self) -> bool {
        self.status.steps.iter().any(ActionStep::any_failed)
    }
}
