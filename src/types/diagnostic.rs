//! Check output: diagnostic results, conditions and impacted objects.
//!
//! Impact is authoritative: a condition is failing exactly when its impact is not `None`.
//! The constructors keep `status` consistent with that rule, so pass/fail counting and
//! exit codes can never disagree.
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::group::CheckGroup;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Impact {
    #[default]
    None,
    Advisory,
    Blocking,
}

impl Impact {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Impact::None => "none",
            Impact::Advisory => "advisory",
            Impact::Blocking => "blocking",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: bool,
    pub reason: String,
    pub message: String,
    pub impact: Impact,
}

impl Condition {
    pub fn pass(
        condition_type: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            condition_type: condition_type.into(),
            status: true,
            reason: reason.into(),
            message: message.into(),
            impact: Impact::None,
        }
    }

    pub fn blocking(
        condition_type: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::failing(condition_type, reason, message, Impact::Blocking)
    }

    pub fn advisory(
        condition_type: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::failing(condition_type, reason, message, Impact::Advisory)
    }

    fn failing(
        condition_type: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
        impact: Impact,
    ) -> Self {
        Self {
            condition_type: condition_type.into(),
            status: false,
            reason: reason.into(),
            message: message.into(),
            impact,
        }
    }

    #[must_use]
    pub fn is_failing(&self) -> bool {
        self.impact != Impact::None
    }
}

/// Reference to a cluster object a failing check points at, for remediation guidance.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImpactedObject {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub group: CheckGroup,
    pub kind: String,
    pub name: String,
    pub description: String,
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub impacted_objects: Vec<ImpactedObject>,
}

impl DiagnosticResult {
    pub fn new(
        group: CheckGroup,
        kind: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            group,
            kind: kind.into(),
            name: name.into(),
            description: description.into(),
            conditions: Vec::new(),
            impacted_objects: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_condition(mut self, c: Condition) -> Self {
        self.conditions.push(c);
        self
    }

    #[must_use]
    pub fn with_impacted(mut self, obj: ImpactedObject) -> Self {
        self.impacted_objects.push(obj);
        self
    }

    /// Highest impact across all conditions.
    #[must_use]
    pub fn max_impact(&self) -> Impact {
        self.conditions
            .iter()
            .map(|c| c.impact)
            .max()
            .unwrap_or(Impact::None)
    }

    #[must_use]
    pub fn is_passing(&self) -> bool {
        self.max_impact() == Impact::None
    }
}

/// One executed check: the rule id, its result, and the execution error if the rule
/// itself failed to run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckExecution {
    pub check_id: String,
    pub result: DiagnosticResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckExecution {
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

fn canonical_cmp(a: &CheckExecution, b: &CheckExecution) -> Ordering {
    a.result
        .group
        .cmp(&b.result.group)
        .then_with(|| a.result.kind.cmp(&b.result.kind))
        .then_with(|| a.result.name.cmp(&b.result.name))
}

/// Sort executions into canonical order: category (Dependency, Service, Component,
/// Workload), then kind, then name. The sort is stable, so repeated executions of the
/// same rule keep their discovery order.
#[must_use]
pub fn flatten_results(mut executions: Vec<CheckExecution>) -> Vec<CheckExecution> {
    executions.sort_by(canonical_cmp);
    executions
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintSummary {
    pub total: u64,
    pub passed: u64,
    pub blocking: u64,
    pub advisory: u64,
    pub errors: u64,
}

impl LintSummary {
    #[must_use]
    pub fn of(executions: &[CheckExecution]) -> Self {
        let mut s = Self::default();
        for e in executions {
            s.total += 1;
            if e.is_error() {
                s.errors += 1;
            }
            match e.result.max_impact() {
                Impact::None => s.passed += 1,
                Impact::Advisory => s.advisory += 1,
                Impact::Blocking => s.blocking += 1,
            }
        }
        s
    }
}
