use crate::catalog::MANAGED;
use crate::rules::{Check, Gate, Rule, RuleMeta};
use crate::types::errors::Result;
use crate::types::{CheckGroup, Condition, Deadline, DiagnosticResult, Target, Version};

/// The platform-managed service mesh is deprecated in 3.x. Advisory only: the upgrade
/// proceeds, but the mesh stops being reconciled.
pub struct ServiceMeshDeprecation {
    meta: RuleMeta<CheckGroup>,
    gate: Gate,
}

impl ServiceMeshDeprecation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "services.servicemesh.deprecation",
                "Service mesh deprecation",
                "Platform-managed service mesh is deprecated in 3.x",
                CheckGroup::Service,
            ),
            gate: Gate::crossing(3, 0),
        }
    }
}

impl Default for ServiceMeshDeprecation {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for ServiceMeshDeprecation {
    type Group = CheckGroup;

    fn meta(&self) -> &RuleMeta<CheckGroup> {
        &self.meta
    }

    fn can_apply(&self, current: &Version, target: &Version) -> bool {
        self.gate.allows(current, target)
    }
}

impl Check for ServiceMeshDeprecation {
    fn validate(&self, deadline: &Deadline, target: &Target) -> Result<DiagnosticResult> {
        let dsci = target.client().initialization(deadline)?;
        let state = dsci
            .str_at("/spec/serviceMesh/managementState")
            .unwrap_or("Removed");
        let cond = if state == MANAGED {
            Condition::advisory(
                "Deprecated",
                "ServiceMeshManaged",
                "service mesh is managed by the platform; \
                 it will no longer be reconciled after the upgrade",
            )
        } else {
            Condition::pass(
                "Deprecated",
                "ServiceMeshNotManaged",
                format!("service mesh is {state}"),
            )
        };
        Ok(self.meta.result().with_condition(cond))
    }
}
