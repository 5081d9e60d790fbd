use crate::catalog::cert_manager_subscription;
use crate::cluster::{find_subscription, SubscriptionSpec};
use crate::rules::{Check, Gate, Rule, RuleMeta};
use crate::types::errors::Result;
use crate::types::{CheckGroup, Condition, Deadline, DiagnosticResult, Target, Version};

/// 3.x serving needs the cert-manager operator installed before the upgrade.
pub struct CertManagerInstalled {
    meta: RuleMeta<CheckGroup>,
    gate: Gate,
    subscription: SubscriptionSpec,
}

impl CertManagerInstalled {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "dependencies.certmanager.installed",
                "cert-manager operator",
                "The cert-manager operator is required by 3.x serving",
                CheckGroup::Dependency,
            ),
            gate: Gate::crossing(3, 0),
            subscription: cert_manager_subscription(),
        }
    }
}

impl Default for CertManagerInstalled {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for CertManagerInstalled {
    type Group = CheckGroup;

    fn meta(&self) -> &RuleMeta<CheckGroup> {
        &self.meta
    }

    fn can_apply(&self, current: &Version, target: &Version) -> bool {
        self.gate.allows(current, target)
    }
}

impl Check for CertManagerInstalled {
    fn validate(&self, deadline: &Deadline, target: &Target) -> Result<DiagnosticResult> {
        let sub = &self.subscription;
        let cond = match find_subscription(deadline, target.client(), sub)? {
            Some(found) => match found.str_at("/status/installedCSV") {
                Some(csv) => {
                    Condition::pass("Installed", "SubscriptionFound", format!("{csv} installed"))
                }
                None => Condition::advisory(
                    "Installed",
                    "InstallPending",
                    format!(
                        "subscription {}/{} exists but has not installed yet",
                        sub.namespace, sub.name
                    ),
                ),
            },
            None => Condition::blocking(
                "Installed",
                "SubscriptionMissing",
                format!(
                    "operator subscription {}/{} not found; install {} before upgrading",
                    sub.namespace, sub.name, sub.package
                ),
            ),
        };
        Ok(self.meta.result().with_condition(cond))
    }
}
