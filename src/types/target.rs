//! The execution context handed to every rule.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::{AutoConfirm, ClusterClient, Confirmer, Resource};
use crate::constants::DEFAULT_OUTPUT_DIR;
use crate::policy::Policy;
use crate::recorder::StepRecorder;

use super::action::StepStatus;
use super::errors::{Error, Result};
use super::version::Version;

/// Cluster handle, version pair, flags and recorder for one invocation.
///
/// A `Target` is built once and cloned cheaply; the only field that varies between rule
/// invocations is the per-instance [`resource`](Target::resource) for workload checks and the
/// recorder attached for each action phase.
#[derive(Clone)]
pub struct Target {
    client: Arc<dyn ClusterClient>,
    current: Version,
    target: Version,
    resource: Option<Resource>,
    dry_run: bool,
    skip_confirm: bool,
    output_dir: PathBuf,
    policy: Policy,
    recorder: Option<Arc<dyn StepRecorder>>,
    confirmer: Arc<dyn Confirmer>,
}

impl Target {
    /// Lint-mode target: current and goal versions are equal.
    pub fn new(client: Arc<dyn ClusterClient>, current: Version) -> Self {
        Self {
            client,
            target: current.clone(),
            current,
            resource: None,
            dry_run: false,
            skip_confirm: false,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            policy: Policy::default(),
            recorder: None,
            confirmer: Arc::new(AutoConfirm(false)),
        }
    }

    #[must_use]
    pub fn with_target_version(mut self, target: Version) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn with_skip_confirm(mut self, skip: bool) -> Self {
        self.skip_confirm = skip;
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn StepRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn client(&self) -> &dyn ClusterClient {
        self.client.as_ref()
    }

    pub fn current(&self) -> &Version {
        &self.current
    }

    pub fn target(&self) -> &Version {
        &self.target
    }

    pub fn resource(&self) -> Option<&Resource> {
        self.resource.as_ref()
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn skip_confirm(&self) -> bool {
        self.skip_confirm
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// The recorder of the action phase being executed.
    ///
    /// # Errors
    /// Returns `Invalid` when no recorder is attached (for example, an action invoked outside
    /// the orchestrator).
    pub fn recorder(&self) -> Result<&dyn StepRecorder> {
        self.recorder
            .as_deref()
            .ok_or_else(|| Error::invalid("no step recorder attached to target"))
    }

    /// Ask before a mutation. Always proceeds in dry-run or with skip-confirm.
    ///
    /// A decline records a Skipped "user cancelled" child under `step` and marks the action
    /// cancelled, so it reports incomplete without failing.
    pub fn confirm(&self, step: &dyn StepRecorder, prompt: &str) -> bool {
        if self.dry_run || self.skip_confirm {
            return true;
        }
        if self.confirmer.confirm(prompt) {
            return true;
        }
        step.record("confirm", "user cancelled", StepStatus::Skipped);
        step.mark_cancelled();
        false
    }

    /// Gate a single mutating sub-step: in dry-run, record what would happen and return
    /// false; otherwise ask for confirmation.
    ///
    /// Every mutating sub-step calls this on its own; dry-run is never decided once per action.
    pub fn may_mutate(&self, step: &dyn StepRecorder, would: &str) -> bool {
        if self.dry_run {
            step.record("dry-run", &format!("would {would}"), StepStatus::Skipped);
            return false;
        }
        self.confirm(step, &format!("Proceed to {would}?"))
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("current", &self.current)
            .field("target", &self.target)
            .field("resource", &self.resource.as_ref().map(Resource::name))
            .field("dry_run", &self.dry_run)
            .field("skip_confirm", &self.skip_confirm)
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}
