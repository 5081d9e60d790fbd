use crate::catalog::MANAGED;
use crate::rules::{Check, Gate, Rule, RuleMeta};
use crate::types::errors::Result;
use crate::types::{CheckGroup, Condition, Deadline, DiagnosticResult, Target, Version};

/// Blocks an upgrade into 3.x while a component removed in 3.x is still `Managed` in the
/// primary configuration.
pub struct ManagementStateRemoval {
    meta: RuleMeta<CheckGroup>,
    gate: Gate,
    pointer: &'static str,
    component: &'static str,
}

impl ManagementStateRemoval {
    #[must_use]
    pub fn kserve_serverless() -> Self {
        Self {
            meta: RuleMeta::new(
                "components.kserve.serverless-removal",
                "KServe serverless removal",
                "KServe serverless mode is removed in 3.x; serving must move to RawDeployment",
                CheckGroup::Component,
            ),
            gate: Gate::crossing(3, 0),
            pointer: "/spec/components/kserve/serving/managementState",
            component: "KServe serverless (Knative) serving",
        }
    }

    #[must_use]
    pub fn modelmesh() -> Self {
        Self {
            meta: RuleMeta::new(
                "components.modelmesh.removal",
                "ModelMesh removal",
                "ModelMesh serving is removed in 3.x",
                CheckGroup::Component,
            ),
            gate: Gate::crossing(3, 0),
            pointer: "/spec/components/modelmeshserving/managementState",
            component: "ModelMesh serving",
        }
    }
}

impl Rule for ManagementStateRemoval {
    type Group = CheckGroup;

    fn meta(&self) -> &RuleMeta<CheckGroup> {
        &self.meta
    }

    fn can_apply(&self, current: &Version, target: &Version) -> bool {
        self.gate.allows(current, target)
    }
}

impl Check for ManagementStateRemoval {
    fn validate(&self, deadline: &Deadline, target: &Target) -> Result<DiagnosticResult> {
        let dsc = target.client().primary_config(deadline)?;
        let state = dsc.str_at(self.pointer).unwrap_or("Removed");
        let cond = if state == MANAGED {
            Condition::blocking(
                "Compatible",
                "ComponentRemoved",
                format!(
                    "{} is {state} in {} but is not available in {}; \
                     remove or migrate it before upgrading",
                    self.component,
                    dsc.name(),
                    target.target()
                ),
            )
        } else {
            Condition::pass(
                "Compatible",
                "ComponentNotManaged",
                format!("{} is {state}", self.component),
            )
        };
        Ok(self.meta.result().with_condition(cond))
    }
}
