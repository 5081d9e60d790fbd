use serde_json::{json, Value};

use crate::adapters::{kinds, Resource};
use crate::catalog::{cert_manager_subscription, MANAGED, MODE_RAW, REMOVED};
use crate::cluster::{
    ensure_subscription, find_subscription, update_with_retry, wait_for_install, Ensured,
    SubscriptionSpec,
};
use crate::constants::PRESERVED_CONFIG_ANNOTATION;
use crate::recorder::StepRecorder;
use crate::rules::{Action, Gate, Rule, RuleMeta};
use crate::types::errors::{Error, Result};
use crate::types::{ActionGroup, Deadline, StepStatus, Target, Version};

use super::backup::backup_kinds;
use super::fail;

const SERVING_PTR: &str = "/spec/components/kserve/serving";
const SERVING_STATE_PTR: &str = "/spec/components/kserve/serving/managementState";
const DEFAULT_MODE_PTR: &str = "/spec/components/kserve/defaultDeploymentMode";

/// Move KServe from serverless (Knative) serving to RawDeployment.
///
/// Execute runs three sub-steps in order, each gated on its own for dry-run and
/// confirmation:
/// 1. install the cert-manager operator and wait until its install succeeds;
/// 2. preserve the serverless serving block in an annotation on the primary configuration;
/// 3. switch the default deployment mode and remove serverless serving.
///
/// A declined confirmation stops the remaining sub-steps; dry-run walks all of them.
pub struct KserveRawDeployment {
    meta: RuleMeta<ActionGroup>,
    gate: Gate,
    operator: SubscriptionSpec,
}

impl KserveRawDeployment {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "migration.kserve.raw-deployment",
                "KServe RawDeployment migration",
                "Switch KServe from serverless serving to RawDeployment",
                ActionGroup::Migration,
            ),
            gate: Gate::crossing(3, 0),
            operator: cert_manager_subscription(),
        }
    }

    fn already_migrated(dsc: &Resource) -> bool {
        dsc.str_at(DEFAULT_MODE_PTR) == Some(MODE_RAW)
            && dsc.str_at(SERVING_STATE_PTR) != Some(MANAGED)
    }

    // Ok(false) means the operator declined and nothing further should run.
    fn install_operator(
        &self,
        deadline: &Deadline,
        target: &Target,
        rec: &dyn StepRecorder,
    ) -> Result<bool> {
        let op = &self.operator;
        let step = rec.child(
            "install-operator",
            &format!("subscription {}/{}", op.namespace, op.name),
        );
        let existing = find_subscription(deadline, target.client(), op)
            .map_err(|e| fail(step.as_ref(), e, "looking up operator subscription"))?;
        if existing.is_none() {
            let would = format!("create subscription {}/{}", op.namespace, op.name);
            if !target.may_mutate(step.as_ref(), &would) {
                step.complete(StepStatus::Skipped, "subscription not created");
                return Ok(target.dry_run());
            }
            let ensured = ensure_subscription(deadline, target.client(), op)
                .map_err(|e| fail(step.as_ref(), e, "installing operator"))?;
            if let Ensured::Created(_) = ensured {
                let msg = format!("created {}/{}", op.namespace, op.name);
                step.record("create", &msg, StepStatus::Completed);
            }
        }

        let wait = step.child("wait-ready", "operator install to succeed");
        let readiness = &target.policy().readiness;
        let csv = wait_for_install(deadline, target.client(), readiness, &op.namespace, &op.name)
            .map_err(|e| {
                let e = fail(wait.as_ref(), e, "installing operator");
                step.complete(StepStatus::Failed, "operator not ready");
                e
            })?;
        wait.add_detail("installedCSV", json!(csv.name()));
        wait.complete(StepStatus::Completed, &format!("{} succeeded", csv.name()));
        step.complete(StepStatus::Completed, &format!("{} ready", op.package));
        Ok(true)
    }

    fn preserve_config(
        &self,
        deadline: &Deadline,
        target: &Target,
        rec: &dyn StepRecorder,
        dsc: &Resource,
    ) -> Result<bool> {
        let step = rec.child("preserve-config", "record serverless serving config");
        if dsc.annotation(PRESERVED_CONFIG_ANNOTATION).is_some() {
            step.complete(StepStatus::Completed, "already preserved");
            return Ok(true);
        }
        let serving = dsc.0.pointer(SERVING_PTR).cloned().unwrap_or(Value::Null);
        let text = serde_json::to_string(&serving)?;
        step.add_detail("preserved", serving);
        let would = format!("annotate {} with the serving config", dsc.name());
        if !target.may_mutate(step.as_ref(), &would) {
            step.complete(StepStatus::Skipped, "config not preserved");
            return Ok(target.dry_run());
        }
        let updated = update_with_retry(
            deadline,
            target.client(),
            &target.policy().retry,
            &kinds::data_science_cluster(),
            None,
            dsc.name(),
            |obj| {
                obj.set_annotation(PRESERVED_CONFIG_ANNOTATION, &text);
                Ok(())
            },
        )
        .map_err(|e| fail(step.as_ref(), e, "preserving serving config"))?;
        step.add_detail("attempts", json!(updated.attempts));
        step.complete(StepStatus::Completed, &format!("annotated {}", dsc.name()));
        Ok(true)
    }

    fn update_config(
        &self,
        deadline: &Deadline,
        target: &Target,
        rec: &dyn StepRecorder,
        dsc: &Resource,
    ) -> Result<()> {
        let step = rec.child(
            "update-config",
            &format!("defaultDeploymentMode={MODE_RAW}, serving={REMOVED}"),
        );
        if !target.may_mutate(step.as_ref(), &format!("update {}", dsc.name())) {
            step.complete(StepStatus::Skipped, "configuration not changed");
            return Ok(());
        }
        let updated = update_with_retry(
            deadline,
            target.client(),
            &target.policy().retry,
            &kinds::data_science_cluster(),
            None,
            dsc.name(),
            |obj| {
                obj.set_at(DEFAULT_MODE_PTR, json!(MODE_RAW));
                obj.set_at(SERVING_STATE_PTR, json!(REMOVED));
                Ok(())
            },
        )
        .map_err(|e| fail(step.as_ref(), e, "updating platform configuration"))?;
        step.add_detail("attempts", json!(updated.attempts));
        let msg = format!("{} now defaults to {MODE_RAW}", dsc.name());
        step.complete(StepStatus::Completed, &msg);
        Ok(())
    }
}

impl Default for KserveRawDeployment {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for KserveRawDeployment {
    type Group = ActionGroup;

    fn meta(&self) -> &RuleMeta<ActionGroup> {
        &self.meta
    }

    fn can_apply(&self, current: &Version, target: &Version) -> bool {
        self.gate.allows(current, target)
    }
}

impl Action for KserveRawDeployment {
    fn has_prepare(&self) -> bool {
        true
    }

    fn prepare(&self, deadline: &Deadline, target: &Target) -> Result<()> {
        let rec = target.recorder()?;

        let step = rec.child("validate", "read platform configuration");
        let dsc = target
            .client()
            .primary_config(deadline)
            .map_err(|e| fail(step.as_ref(), e, "reading platform configuration"))?;
        step.add_detail("defaultDeploymentMode", json!(dsc.str_at(DEFAULT_MODE_PTR)));
        step.add_detail("servingState", json!(dsc.str_at(SERVING_STATE_PTR)));
        if Self::already_migrated(&dsc) {
            step.complete(StepStatus::Completed, "already on RawDeployment");
        } else {
            step.complete(StepStatus::Completed, "serverless configuration found");
        }

        let dir = target.output_dir();
        let backup = rec.child("backup", &format!("write YAML to {}", dir.display()));
        let kinds = [kinds::data_science_cluster(), kinds::inference_service()];
        let total = backup_kinds(deadline, target, backup.as_ref(), &kinds, dir)
            .map_err(|e| fail(backup.as_ref(), e, "backup before migration"))?;
        backup.complete(StepStatus::Completed, &format!("{total} file(s) written"));
        Ok(())
    }

    fn execute(&self, deadline: &Deadline, target: &Target) -> Result<()> {
        let rec = target.recorder()?;
        let dsc = target.client().primary_config(deadline).map_err(|e| {
            rec.record("read-config", &e.msg, StepStatus::Failed);
            e.context("reading platform configuration")
        })?;
        if Self::already_migrated(&dsc) {
            rec.record("check", "already on RawDeployment", StepStatus::Skipped);
            return Ok(());
        }
        if dsc.name().is_empty() {
            return Err(Error::invalid("platform configuration has no name"));
        }

        if !self.install_operator(deadline, target, rec)? {
            return Ok(());
        }
        if !self.preserve_config(deadline, target, rec, &dsc)? {
            return Ok(());
        }
        self.update_config(deadline, target, rec, &dsc)
    }
}
