// Facade for API module; delegates to submodules under src/api/

use std::io::Write;
use std::sync::Arc;

use crate::adapters::{ClusterClient, VersionDetector};
use crate::logging::{AuditSink, FactsEmitter};
use crate::policy::Policy;
use crate::recorder::{SharedSink, StreamingRecorder};
use crate::registry::{ActionRegistry, CheckRegistry};
use crate::types::{Deadline, Target, Version};

pub mod errors;
pub mod lint;
pub mod migrate;

pub use errors::{exit_code_for, id_str, ApiError, ErrorId};
pub use lint::{execute_check, execute_checks, exit_code_for_lint, LintReport, LintRequest};
pub use migrate::{
    exit_code_for_migration, Halt, MigrateRequest, MigrationFilter, MigrationInfo,
    MigrationReport, Phase, Phases,
};

pub struct Waypoint<E: FactsEmitter, A: AuditSink> {
    facts: E,
    audit: A,
    policy: Policy,
    checks: CheckRegistry,
    actions: ActionRegistry,
    step_sink: Option<SharedSink>, // None: steps are only rendered from the final tree
    step_prefix: String,
}

impl<E: FactsEmitter, A: AuditSink> Waypoint<E, A> {
    /// A facade with empty registries; add rules with [`with_checks`](Self::with_checks) and
    /// [`with_actions`](Self::with_actions).
    pub fn new(facts: E, audit: A, policy: Policy) -> Self {
        Self {
            facts,
            audit,
            policy,
            checks: CheckRegistry::new(),
            actions: ActionRegistry::new(),
            step_sink: None,
            step_prefix: String::new(),
        }
    }

    #[must_use]
    pub fn with_checks(mut self, checks: CheckRegistry) -> Self {
        self.checks = checks;
        self
    }

    #[must_use]
    pub fn with_actions(mut self, actions: ActionRegistry) -> Self {
        self.actions = actions;
        self
    }

    /// Stream action steps to `out` as they happen.
    #[must_use]
    pub fn with_step_stream<W: Write + Send + 'static>(mut self, out: W) -> Self {
        self.step_sink = Some(StreamingRecorder::sink(out));
        self
    }

    /// Stream action steps to an already shared sink.
    #[must_use]
    pub fn with_shared_step_stream(mut self, sink: SharedSink) -> Self {
        self.step_sink = Some(sink);
        self
    }

    /// Text put in front of every streamed line.
    #[must_use]
    pub fn with_step_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.step_prefix = prefix.into();
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn checks(&self) -> &CheckRegistry {
        &self.checks
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    /// A deadline derived from the policy's overall timeout.
    #[must_use]
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.policy.timeout())
    }

    /// A target bound to this facade's policy. Lint mode until a goal version is set.
    pub fn target(&self, client: Arc<dyn ClusterClient>, current: Version) -> Target {
        Target::new(client, current).with_policy(self.policy.clone())
    }

    /// # Errors
    /// Returns `Detect` (or `Timeout`) wrapping the detector's error.
    pub fn detect_version(
        &self,
        deadline: &Deadline,
        detector: &dyn VersionDetector,
        client: &dyn ClusterClient,
    ) -> Result<Version, ApiError> {
        detector.detect(deadline, client).map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(format!("detecting cluster version: {}", e.msg))
            } else {
                ApiError::Detect(e.to_string())
            }
        })
    }

    /// Run the selected checks against `target`.
    ///
    /// # Errors
    /// Returns `Selection` for an invalid selector; no check runs in that case. Errors from
    /// individual checks are captured into their results instead.
    pub fn lint(
        &self,
        deadline: &Deadline,
        target: &Target,
        request: &LintRequest,
    ) -> Result<LintReport, ApiError> {
        lint::run(self, deadline, target, request)
    }

    /// Run the requested actions in order, halting at the first failure.
    ///
    /// # Errors
    /// Returns `UnknownRule` when any requested id is not registered; nothing runs in that
    /// case. Failures while running are reported in [`MigrationReport::halted`].
    pub fn migrate(
        &self,
        deadline: &Deadline,
        target: &Target,
        request: &MigrateRequest,
    ) -> Result<MigrationReport, ApiError> {
        migrate::run(self, deadline, target, request)
    }

    pub fn list_migrations(
        &self,
        current: &Version,
        filter: &MigrationFilter,
    ) -> Vec<MigrationInfo> {
        migrate::list(self, current, filter)
    }
}
