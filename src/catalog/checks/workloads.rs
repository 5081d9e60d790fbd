use crate::adapters::{kinds, ResourceKind};
use crate::catalog::{DEPLOYMENT_MODE_ANNOTATION, MODE_SERVERLESS};
use crate::rules::{Check, Gate, Rule, RuleMeta};
use crate::types::errors::{Error, Result};
use crate::types::{
    CheckGroup, Condition, Deadline, DiagnosticResult, ImpactedObject, Target, Version,
};

/// Runs once per InferenceService. Serverless services (explicit annotation, or no annotation
/// so the serverless default applies) stop working in 3.x.
pub struct ServerlessInferenceService {
    meta: RuleMeta<CheckGroup>,
    gate: Gate,
}

impl ServerlessInferenceService {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "workloads.kserve.serverless-isvc",
                "Serverless InferenceService",
                "InferenceServices deployed in serverless mode must move to RawDeployment",
                CheckGroup::Workload,
            ),
            gate: Gate::crossing(3, 0),
        }
    }
}

impl Default for ServerlessInferenceService {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ServerlessInferenceService {
    type Group = CheckGroup;

    fn meta(&self) -> &RuleMeta<CheckGroup> {
        &self.meta
    }

    fn can_apply(&self, current: &Version, target: &Version) -> bool {
        self.gate.allows(current, target)
    }
}

impl Check for ServerlessInferenceService {
    fn validate(&self, _deadline: &Deadline, target: &Target) -> Result<DiagnosticResult> {
        let isvc = target
            .resource()
            .ok_or_else(|| Error::invalid("workload check invoked without an InferenceService"))?;
        let ns = isvc.namespace().unwrap_or_default();
        let mode = isvc.annotation(DEPLOYMENT_MODE_ANNOTATION);
        let result = self.meta.result();
        if mode.is_some_and(|m| m != MODE_SERVERLESS) {
            return Ok(result.with_condition(Condition::pass(
                "Compatible",
                "RawDeployment",
                format!("{ns}/{} uses {}", isvc.name(), mode.unwrap_or_default()),
            )));
        }
        let why = if mode.is_some() {
            "is annotated Serverless"
        } else {
            "has no deployment mode annotation and defaults to Serverless"
        };
        Ok(result
            .with_condition(Condition::blocking(
                "Compatible",
                "ServerlessMode",
                format!("InferenceService {ns}/{} {why}", isvc.name()),
            ))
            .with_impacted(ImpactedObject {
                kind: isvc.kind().to_string(),
                namespace: isvc.namespace().map(str::to_string),
                name: isvc.name().to_string(),
            }))
    }

    fn workload_kind(&self) -> Option<ResourceKind> {
        Some(kinds::inference_service())
    }
}
