// Audit helpers that emit facts across waypoint stages.
//
// Side-effects:
// - Emits JSON facts via `FactsEmitter` for `lint.check`, `lint.summary`, `migrate.prepare`,
//   `migrate.execute` and `migrate.summary`.
// - Ensures a minimal envelope is present on every fact: `schema_version`, `ts`,
//   `run_id`, `dry_run`.
// - Applies redaction in dry-run to zero timestamps and drop volatile fields.
use serde_json::{json, Value};

use crate::constants::FACTS_SUBSYSTEM;
use crate::logging::{redact_event, FactsEmitter};

pub const SCHEMA_VERSION: i64 = 1;

#[derive(Clone, Copy, Debug, Default)]
pub struct AuditMode {
    pub dry_run: bool,
    pub redact: bool,
}

pub struct AuditCtx<'a> {
    pub facts: &'a dyn FactsEmitter,
    pub run_id: String,
    pub ts: String,
    pub mode: AuditMode,
}

impl<'a> AuditCtx<'a> {
    pub fn new(facts: &'a dyn FactsEmitter, run_id: String, ts: String, mode: AuditMode) -> Self {
        Self {
            facts,
            run_id,
            ts,
            mode,
        }
    }
}

/// Stage for typed audit emission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    LintCheck,
    LintSummary,
    MigratePrepare,
    MigrateExecute,
    MigrateSummary,
}

impl Stage {
    #[must_use]
    pub const fn as_event(self) -> &'static str {
        match self {
            Stage::LintCheck => "lint.check",
            Stage::LintSummary => "lint.summary",
            Stage::MigratePrepare => "migrate.prepare",
            Stage::MigrateExecute => "migrate.execute",
            Stage::MigrateSummary => "migrate.summary",
        }
    }
}

/// Decision severity for audit events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Success,
    Failure,
    Warn,
}

impl Decision {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Decision::Success => "success",
            Decision::Failure => "failure",
            Decision::Warn => "warn",
        }
    }
}

/// Builder facade over audit emission with centralized envelope+redaction.
pub struct StageLogger<'a> {
    ctx: &'a AuditCtx<'a>,
}

impl<'a> StageLogger<'a> {
    #[must_use]
    pub fn new(ctx: &'a AuditCtx<'a>) -> Self {
        Self { ctx }
    }

    #[must_use]
    pub fn lint_check(&self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::LintCheck)
    }
    #[must_use]
    pub fn lint_summary(&self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::LintSummary)
    }
    #[must_use]
    pub fn migrate_prepare(&self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::MigratePrepare)
    }
    #[must_use]
    pub fn migrate_execute(&self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::MigrateExecute)
    }
    #[must_use]
    pub fn migrate_summary(&self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::MigrateSummary)
    }
}

pub struct EventBuilder<'a> {
    ctx: &'a AuditCtx<'a>,
    stage: Stage,
    fields: serde_json::Map<String, Value>,
}

impl<'a> EventBuilder<'a> {
    fn new(ctx: &'a AuditCtx<'a>, stage: Stage) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("stage".to_string(), json!(stage.as_event()));
        Self { ctx, stage, fields }
    }

    #[must_use]
    pub fn rule(mut self, rule_id: impl Into<String>) -> Self {
        self.fields.insert("rule".into(), json!(rule_id.into()));
        self
    }

    #[must_use]
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    #[must_use]
    pub fn merge(mut self, extra: Value) -> Self {
        if let Some(obj) = extra.as_object() {
            for (k, v) in obj {
                self.fields.insert(k.clone(), v.clone());
            }
        }
        self
    }

    pub fn emit(self, decision: Decision) {
        let mut fields = Value::Object(self.fields);
        if let Some(obj) = fields.as_object_mut() {
            obj.entry("decision").or_insert(json!(decision.as_str()));
        }
        redact_and_emit(self.ctx, self.stage.as_event(), decision.as_str(), fields);
    }

    pub fn emit_success(self) {
        self.emit(Decision::Success);
    }
    pub fn emit_failure(self) {
        self.emit(Decision::Failure);
    }
    pub fn emit_warn(self) {
        self.emit(Decision::Warn);
    }
}

fn redact_and_emit(ctx: &AuditCtx, event: &str, decision: &str, mut fields: Value) {
    if let Some(obj) = fields.as_object_mut() {
        obj.entry("schema_version").or_insert(json!(SCHEMA_VERSION));
        obj.entry("ts").or_insert(json!(ctx.ts));
        obj.entry("run_id").or_insert(json!(ctx.run_id));
        obj.entry("dry_run").or_insert(json!(ctx.mode.dry_run));
    }
    let out = if ctx.mode.redact {
        redact_event(fields)
    } else {
        fields
    };
    ctx.facts.emit(FACTS_SUBSYSTEM, event, decision, out);
}
