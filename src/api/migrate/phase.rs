use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::json;

use crate::api::errors::{id_str, map_rule_error, ApiError};
use crate::api::Waypoint;
use crate::logging::{AuditSink, FactsEmitter, StageLogger};
use crate::recorder::{StepRecorder, StreamingRecorder, TreeRecorder};
use crate::rules::{Action, Rule};
use crate::types::errors::Error;
use crate::types::{ActionMetadata, ActionResult, ActionSpec, Deadline, StepStatus, Target};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Prepare,
    Execute,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Prepare => "prepare",
            Phase::Execute => "execute",
        }
    }
}

pub(super) struct PhaseOutcome {
    pub result: ActionResult,
    pub error: Option<Error>,
}

fn root_recorder<E: FactsEmitter, A: AuditSink>(
    api: &Waypoint<E, A>,
    meta: ActionMetadata,
    spec: ActionSpec,
) -> Arc<dyn StepRecorder> {
    match &api.step_sink {
        Some(sink) => {
            let prefix = format!("{}[{}:{}] ", api.step_prefix, meta.name, meta.kind);
            Arc::new(StreamingRecorder::root(meta, spec, Arc::clone(sink), &prefix))
        }
        None => Arc::new(TreeRecorder::root(meta, spec)),
    }
}

fn metadata(action: &dyn Action, phase: Phase) -> ActionMetadata {
    let meta = action.meta();
    ActionMetadata {
        group: meta.group,
        kind: phase.as_str().to_string(),
        name: meta.id.clone(),
    }
}

fn spec(action: &dyn Action, target: &Target) -> ActionSpec {
    ActionSpec {
        description: action.meta().description.clone(),
        dry_run: target.dry_run(),
    }
}

/// Result for a requested action whose version gate rejected the run: a single Skipped step.
/// A skipped action counts as completed.
pub(super) fn skipped<E: FactsEmitter, A: AuditSink>(
    api: &Waypoint<E, A>,
    target: &Target,
    action: &dyn Action,
    reason: &str,
) -> Result<ActionResult, ApiError> {
    let recorder = root_recorder(api, metadata(action, Phase::Execute), spec(action, target));
    recorder.record("version-gate", reason, StepStatus::Skipped);
    recorder
        .build()
        .map_err(|e| ApiError::Recorder(format!("{}: {}", action.id(), e.msg)))
}

/// Run one phase of one action under a fresh root recorder.
pub(super) fn run<E: FactsEmitter, A: AuditSink>(
    api: &Waypoint<E, A>,
    deadline: &Deadline,
    target: &Target,
    action: &dyn Action,
    phase: Phase,
    slog: &StageLogger<'_>,
) -> Result<PhaseOutcome, ApiError> {
    let t0 = Instant::now();
    let meta = action.meta();
    let recorder = root_recorder(api, metadata(action, phase), spec(action, target));
    let t = target.clone().with_recorder(Arc::clone(&recorder));

    let outcome = match phase {
        Phase::Prepare => action.prepare(deadline, &t),
        Phase::Execute => action.execute(deadline, &t),
    };
    let error = outcome.err();
    if let Some(e) = &error {
        // surface the failure in the tree when the action bailed out before recording it
        let recorded = recorder.build().is_ok_and(|r| r.any_failed());
        if !recorded {
            recorder.record(phase.as_str(), &e.to_string(), StepStatus::Failed);
        }
    }

    let mut result = recorder
        .build()
        .map_err(|e| ApiError::Recorder(format!("{}: {}", meta.id, e.msg)))?;
    if let Some(e) = &error {
        result.status.completed = false;
        result.status.error = Some(e.to_string());
    }

    let b = match phase {
        Phase::Prepare => slog.migrate_prepare(),
        Phase::Execute => slog.migrate_execute(),
    }
    .rule(&meta.id)
    .field("completed", json!(result.status.completed))
    .field("steps", json!(result.status.steps.len()))
    .field("duration_ms", json!(u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX)));
    match &error {
        Some(e) => {
            let api_err = map_rule_error(&meta.id, e);
            b.field("error", json!(e.to_string()))
                .field("error_id", json!(id_str(api_err.id())))
                .field("exit_code", json!(api_err.exit_code()))
                .emit_failure();
        }
        None if !result.status.completed => b.emit_warn(),
        None => b.emit_success(),
    }

    Ok(PhaseOutcome { result, error })
}
