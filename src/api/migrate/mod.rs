//! Action orchestrator: prepare/execute sequencing with halt-on-first-failure.
//!
//! Side-effects:
//! - Emits `migrate.prepare` / `migrate.execute` facts per phase and one `migrate.summary`.
//! - Streams step lines when the facade carries a step sink.
//!
//! Unlike the check executor, a failure here stops the whole sequence: once an action errors
//! or reports incomplete, later actions are never attempted.
use std::sync::Arc;

use log::Level;
use serde::Serialize;

use crate::api::errors::{exit_code_for, map_rule_error, ApiError, ErrorId};
use crate::api::Waypoint;
use crate::logging::audit::{AuditCtx, AuditMode};
use crate::logging::{ts_for_mode, AuditSink, FactsEmitter, StageLogger};
use crate::rules::{Action, Rule};
use crate::types::ids::run_id;
use crate::types::{ActionGroup, ActionResult, Deadline, Target, Version};

mod phase;
mod summary;

pub use phase::Phase;

/// Which phases to run for each requested action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phases {
    /// Prepare only (validation and backups).
    PrepareOnly,
    /// Execute only.
    #[default]
    Execute,
    /// Prepare, then execute if prepare completed.
    PrepareThenExecute,
}

impl Phases {
    const fn prepare(self) -> bool {
        matches!(self, Phases::PrepareOnly | Phases::PrepareThenExecute)
    }

    const fn execute(self) -> bool {
        matches!(self, Phases::Execute | Phases::PrepareThenExecute)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MigrateRequest {
    /// Action ids, run strictly in this order.
    pub ids: Vec<String>,
    pub phases: Phases,
}

/// Why a sequence stopped early.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Halt {
    pub rule: String,
    pub phase: Phase,
    pub reason: String,
    #[serde(skip)]
    pub error: Option<ApiError>,
}

#[derive(Clone, Debug, Serialize)]
pub struct MigrationReport {
    pub current_version: Version,
    pub target_version: Version,
    pub dry_run: bool,
    /// One result per phase that ran, in order.
    pub results: Vec<ActionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted: Option<Halt>,
    /// Requested ids never attempted because the sequence halted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_attempted: Vec<String>,
}

impl MigrationReport {
    /// The error that halted the sequence, wrapped with its operation context.
    #[must_use]
    pub fn error(&self) -> Option<ApiError> {
        self.halted.as_ref().map(|h| {
            h.error.clone().unwrap_or_else(|| {
                ApiError::MigrationFailed(format!("{}: {}", h.rule, h.reason))
            })
        })
    }
}

/// Non-zero when any phase errored or reported incomplete.
#[must_use]
pub fn exit_code_for_migration(report: &MigrationReport) -> i32 {
    if let Some(e) = report.error() {
        return e.exit_code();
    }
    if report.results.iter().all(|r| r.status.completed) {
        0
    } else {
        exit_code_for(ErrorId::E_MIGRATION)
    }
}

/// Filter for [`Waypoint::list_migrations`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MigrationFilter {
    All,
    /// Actions whose version gate passes for (current, this target).
    ForTarget(Version),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MigrationInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub group: ActionGroup,
}

pub(crate) fn list<E: FactsEmitter, A: AuditSink>(
    api: &Waypoint<E, A>,
    current: &Version,
    filter: &MigrationFilter,
) -> Vec<MigrationInfo> {
    api.actions
        .list_all()
        .into_iter()
        .filter(|a| match filter {
            MigrationFilter::All => true,
            MigrationFilter::ForTarget(t) => a.can_apply(current, t),
        })
        .map(|a| {
            let m = a.meta();
            MigrationInfo {
                id: m.id.clone(),
                name: m.name.clone(),
                description: m.description.clone(),
                group: m.group,
            }
        })
        .collect()
}

pub(crate) fn run<E: FactsEmitter, A: AuditSink>(
    api: &Waypoint<E, A>,
    deadline: &Deadline,
    target: &Target,
    req: &MigrateRequest,
) -> Result<MigrationReport, ApiError> {
    // Resolve everything before anything runs: one unknown id fails the whole request.
    let actions: Vec<Arc<dyn Action>> = req
        .ids
        .iter()
        .map(|id| api.actions.get(id))
        .collect::<Result<_, _>>()?;

    let dry = target.dry_run();
    let rid = run_id(&req.ids, target.current(), target.target());
    let tctx = AuditCtx::new(
        &api.facts,
        rid.to_string(),
        ts_for_mode(dry),
        AuditMode {
            dry_run: dry,
            redact: dry,
        },
    );
    let slog = StageLogger::new(&tctx);
    api.audit.log(
        Level::Info,
        &format!(
            "migrate: {} action(s) for {} -> {}{}",
            actions.len(),
            target.current(),
            target.target(),
            if dry { " (dry-run)" } else { "" }
        ),
    );

    let mut report = MigrationReport {
        current_version: target.current().clone(),
        target_version: target.target().clone(),
        dry_run: dry,
        results: Vec::new(),
        halted: None,
        not_attempted: Vec::new(),
    };

    for (idx, action) in actions.iter().enumerate() {
        if !action.can_apply(target.current(), target.target()) {
            let reason = format!(
                "not applicable for {} -> {}",
                target.current(),
                target.target()
            );
            api.audit.log(Level::Info, &format!("migrate: skipping {}: {reason}", action.id()));
            report
                .results
                .push(phase::skipped(api, target, action.as_ref(), &reason)?);
            continue;
        }
        let mut phases = Vec::with_capacity(2);
        if req.phases.prepare() && action.has_prepare() {
            phases.push(Phase::Prepare);
        }
        if req.phases.execute() {
            phases.push(Phase::Execute);
        }

        for p in phases {
            let out = phase::run(api, deadline, target, action.as_ref(), p, &slog)?;
            let halt = match (&out.error, out.result.status.completed) {
                (Some(e), _) => Some(Halt {
                    rule: action.id().to_string(),
                    phase: p,
                    reason: e.msg.clone(),
                    error: Some(map_rule_error(action.id(), e)),
                }),
                (None, false) => Some(Halt {
                    rule: action.id().to_string(),
                    phase: p,
                    reason: format!("{} did not complete", p.as_str()),
                    error: None,
                }),
                (None, true) => None,
            };
            report.results.push(out.result);
            if let Some(h) = halt {
                api.audit.log(
                    Level::Error,
                    &format!("migrate: halting at {} ({}): {}", h.rule, h.phase.as_str(), h.reason),
                );
                report.halted = Some(h);
                report.not_attempted = actions[idx + 1..]
                    .iter()
                    .map(|a| a.id().to_string())
                    .collect();
                summary::emit(&slog, &report);
                return Ok(report);
            }
        }
    }

    summary::emit(&slog, &report);
    Ok(report)
}
