//! Check executor: selection, version gating, per-rule isolation and canonical ordering.
//!
//! Side-effects:
//! - Emits a `lint.check` fact per execution and one `lint.summary` fact per run.
//! - Logs a warning and skips the kind when listing workload instances fails.
use std::collections::BTreeMap;
use std::sync::Arc;

use log::Level;
use serde::Serialize;
use serde_json::json;

use crate::api::errors::{exit_code_for, id_str, ApiError, ErrorId};
use crate::api::Waypoint;
use crate::logging::audit::{AuditCtx, AuditMode};
use crate::logging::{ts_for_mode, AuditSink, FactsEmitter, StageLogger};
use crate::policy::Thresholds;
use crate::rules::{Check, Rule};
use crate::types::ids::run_id;
use crate::types::{
    flatten_results, CheckExecution, CheckGroup, Condition, Deadline, Impact, LintSummary, Target,
    Version,
};

/// Which checks to run.
#[derive(Clone, Debug, Default)]
pub struct LintRequest {
    /// Selector patterns, unioned. Empty selects everything.
    pub patterns: Vec<String>,
    pub category: Option<CheckGroup>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LintReport {
    pub current_version: Version,
    pub target_version: Version,
    /// Canonically ordered executions.
    pub checks: Vec<CheckExecution>,
    pub summary: LintSummary,
    /// Ids selected but skipped by their version gate.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_applicable: Vec<String>,
    /// Workload kinds whose instances could not be listed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_kinds: Vec<String>,
}

/// Run `validate` once, turning an execution error into a synthetic failing result so the
/// rest of the batch still runs.
pub fn execute_check(deadline: &Deadline, check: &dyn Check, target: &Target) -> CheckExecution {
    match check.validate(deadline, target) {
        Ok(result) => CheckExecution {
            check_id: check.id().to_string(),
            result,
            error: None,
        },
        Err(e) => {
            let msg = e.to_string();
            let result = check.meta().result().with_condition(Condition::advisory(
                "Validated",
                "ValidationError",
                format!("check could not be evaluated: {msg}"),
            ));
            CheckExecution {
                check_id: check.id().to_string(),
                result,
                error: Some(msg),
            }
        }
    }
}

/// One executor pass: run every check against the same target, in order, isolating failures.
pub fn execute_checks(
    deadline: &Deadline,
    checks: &[Arc<dyn Check>],
    target: &Target,
) -> Vec<CheckExecution> {
    checks
        .iter()
        .map(|c| execute_check(deadline, c.as_ref(), target))
        .collect()
}

pub(crate) fn run<E: FactsEmitter, A: AuditSink>(
    api: &Waypoint<E, A>,
    deadline: &Deadline,
    target: &Target,
    req: &LintRequest,
) -> Result<LintReport, ApiError> {
    let selected = api.checks.select(&req.patterns, req.category)?;
    let rid = run_id(
        &selected.iter().map(|c| c.id()).collect::<Vec<_>>(),
        target.current(),
        target.target(),
    );
    let tctx = AuditCtx::new(
        &api.facts,
        rid.to_string(),
        ts_for_mode(false),
        AuditMode::default(),
    );
    let slog = StageLogger::new(&tctx);

    let (applicable, not_applicable): (Vec<_>, Vec<_>) = selected
        .into_iter()
        .partition(|c| c.can_apply(target.current(), target.target()));
    let not_applicable: Vec<String> = not_applicable.iter().map(|c| c.id().to_string()).collect();
    api.audit.log(
        Level::Info,
        &format!(
            "lint: {} checks applicable for {} -> {}, {} skipped by version gate",
            applicable.len(),
            target.current(),
            target.target(),
            not_applicable.len()
        ),
    );

    let (cluster_wide, workloads): (Vec<_>, Vec<_>) =
        applicable.into_iter().partition(|c| c.workload_kind().is_none());

    let mut executions = execute_checks(deadline, &cluster_wide, target);

    // One pass per discovered instance; listings are shared between checks of the same kind.
    let mut listed = BTreeMap::new();
    let mut skipped_kinds = Vec::new();
    for check in &workloads {
        let Some(kind) = check.workload_kind() else {
            continue;
        };
        let instances = listed.entry(kind.kind.clone()).or_insert_with(|| {
            match target.client().list_resources(deadline, &kind) {
                Ok(items) => Some(items),
                Err(e) => {
                    api.audit.log(
                        Level::Warn,
                        &format!("lint: listing {} failed, skipping its checks: {e}", kind.kind),
                    );
                    skipped_kinds.push(kind.kind.clone());
                    None
                }
            }
        });
        for instance in instances.iter().flatten() {
            let t = target.clone().with_resource(instance.clone());
            executions.push(execute_check(deadline, check.as_ref(), &t));
        }
    }

    let checks = flatten_results(executions);
    for e in &checks {
        let impact = e.result.max_impact();
        let b = slog
            .lint_check()
            .rule(&e.check_id)
            .field("impact", json!(impact.as_str()))
            .field("kind", json!(e.result.kind))
            .field("name", json!(e.result.name));
        match (&e.error, impact) {
            (Some(err), _) => b.field("error", json!(err)).emit_failure(),
            (None, Impact::None) => b.emit_success(),
            (None, _) => b.emit_warn(),
        }
    }

    let summary = LintSummary::of(&checks);
    let code = exit_code_for_lint(&checks, &api.policy.thresholds);
    let b = slog.lint_summary().merge(json!({
        "current_version": target.current().to_string(),
        "target_version": target.target().to_string(),
        "total": summary.total,
        "passed": summary.passed,
        "blocking": summary.blocking,
        "advisory": summary.advisory,
        "errors": summary.errors,
        "exit_code": code,
    }));
    if code == 0 {
        b.emit_success();
    } else {
        let id = if summary.blocking > 0 && api.policy.thresholds.fail_on_critical {
            ErrorId::E_BLOCKING
        } else {
            ErrorId::E_ADVISORY
        };
        b.field("error_id", json!(id_str(id))).emit_failure();
    }

    Ok(LintReport {
        current_version: target.current().clone(),
        target_version: target.target().clone(),
        checks,
        summary,
        not_applicable,
        skipped_kinds,
    })
}

/// Exit code for a lint run: `E_BLOCKING` when a Blocking condition exists and
/// `fail_on_critical` is set, `E_ADVISORY` when an Advisory one exists and `fail_on_warning`
/// is set, otherwise 0. Impact alone decides; a condition with impact None never fails a run.
#[must_use]
pub fn exit_code_for_lint(executions: &[CheckExecution], thresholds: &Thresholds) -> i32 {
    let worst = executions
        .iter()
        .map(|e| e.result.max_impact())
        .max()
        .unwrap_or(Impact::None);
    let has_advisory = executions
        .iter()
        .any(|e| e.result.conditions.iter().any(|c| c.impact == Impact::Advisory));
    if worst == Impact::Blocking && thresholds.fail_on_critical {
        return exit_code_for(ErrorId::E_BLOCKING);
    }
    if has_advisory && thresholds.fail_on_warning {
        return exit_code_for(ErrorId::E_ADVISORY);
    }
    0
}
