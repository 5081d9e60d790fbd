use serde_json::json;

use crate::api::errors::id_str;
use crate::logging::StageLogger;

use super::{exit_code_for_migration, MigrationReport};

pub(super) fn emit(slog: &StageLogger<'_>, report: &MigrationReport) {
    let completed = report.results.iter().filter(|r| r.status.completed).count();
    let code = exit_code_for_migration(report);
    let mut b = slog.migrate_summary().merge(json!({
        "phases": report.results.len(),
        "completed": completed,
        "not_attempted": report.not_attempted,
        "exit_code": code,
    }));
    if let Some(h) = &report.halted {
        b = b
            .field("halted_at", json!(h.rule))
            .field("halted_phase", json!(h.phase.as_str()))
            .field("reason", json!(h.reason));
    }
    match report.error() {
        Some(e) => b.field("error_id", json!(id_str(e.id()))).emit_failure(),
        None if code != 0 => b.emit_warn(),
        None => b.emit_success(),
    }
}
