//! Rule capability traits.
//!
//! A rule carries an identity ([`RuleMeta`]) and a version gate ([`Rule::can_apply`]).
//! Checks add a read-only [`Check::validate`]; actions add the two-phase
//! [`Action::prepare`]/[`Action::execute`] contract. Shared identity is a value embedded in
//! every rule rather than a base type.
use crate::adapters::ResourceKind;
use crate::types::errors::Result;
use crate::types::{ActionGroup, CheckGroup, Deadline, DiagnosticResult, Group, Target, Version};

pub mod gate;

pub use gate::{Gate, VersionRange};

/// Identity shared by every rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleMeta<G> {
    /// Dotted, hierarchical, unique within a registry (`components.kserve.removal`).
    pub id: String,
    pub name: String,
    pub description: String,
    pub group: G,
}

impl<G: Group> RuleMeta<G> {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        group: G,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            group,
        }
    }

    /// Middle of the dotted id: `kserve` in `components.kserve.serverless-removal`.
    #[must_use]
    pub fn kind(&self) -> &str {
        match (self.id.find('.'), self.id.rfind('.')) {
            (Some(first), Some(last)) if first < last => &self.id[first + 1..last],
            (Some(first), _) => &self.id[..first],
            _ => &self.id,
        }
    }

    /// Last segment of the dotted id: `serverless-removal`.
    #[must_use]
    pub fn check_type(&self) -> &str {
        self.id.rsplit('.').next().unwrap_or(&self.id)
    }
}

impl RuleMeta<CheckGroup> {
    /// Empty result labelled with this check's group, kind and type.
    #[must_use]
    pub fn result(&self) -> DiagnosticResult {
        DiagnosticResult::new(self.group, self.kind(), self.check_type(), &self.description)
    }
}

pub trait Rule: Send + Sync {
    type Group: Group;

    fn meta(&self) -> &RuleMeta<Self::Group>;

    /// Version gate. A rule that returns false is skipped without producing a result.
    fn can_apply(&self, current: &Version, target: &Version) -> bool;

    fn id(&self) -> &str {
        &self.meta().id
    }

    fn group(&self) -> Self::Group {
        self.meta().group
    }
}

/// Read-only rule.
pub trait Check: Rule<Group = CheckGroup> {
    /// Evaluate the target. An `Err` means the check could not run, not that it failed.
    ///
    /// # Errors
    /// Any cluster or data error that prevented evaluation.
    fn validate(&self, deadline: &Deadline, target: &Target) -> Result<DiagnosticResult>;

    /// Workload checks name the kind whose instances they run against, once per instance.
    fn workload_kind(&self) -> Option<ResourceKind> {
        None
    }
}

/// Mutating rule. Both phases record their progress into [`Target::recorder`].
pub trait Action: Rule<Group = ActionGroup> {
    /// Whether [`Action::prepare`] does anything.
    fn has_prepare(&self) -> bool {
        false
    }

    /// Pre-flight validation and backups. Idempotent; never mutates the cluster.
    ///
    /// # Errors
    /// Any error that makes the action unsafe to execute.
    fn prepare(&self, _deadline: &Deadline, _target: &Target) -> Result<()> {
        Ok(())
    }

    /// Perform the migration. Each mutating sub-step honors dry-run and confirmation itself.
    ///
    /// # Errors
    /// Any error that aborted the migration.
    fn execute(&self, deadline: &Deadline, target: &Target) -> Result<()>;
}
