use std::fmt::Write as _;

use crate::api::{LintReport, MigrationInfo, MigrationReport};
use crate::types::{CheckExecution, Impact};

fn row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut s = String::new();
    for (i, (cell, &w)) in cells.zip(widths).enumerate() {
        if i > 0 {
            s.push_str("  ");
        }
        let _ = write!(s, "{cell:<w$}");
    }
    s.truncate(s.trim_end().len());
    s.push('\n');
    s
}

fn grid(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for r in rows {
        for (w, cell) in widths.iter_mut().zip(r) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let mut out = row(header.iter().copied(), &widths);
    for r in rows {
        out.push_str(&row(r.iter().map(String::as_str), &widths));
    }
    out
}

fn status(exec: &CheckExecution) -> &'static str {
    if exec.is_error() {
        return "ERROR";
    }
    match exec.result.max_impact() {
        Impact::Blocking => "BLOCKING",
        Impact::Advisory => "ADVISORY",
        Impact::None => "PASS",
    }
}

fn message(exec: &CheckExecution) -> String {
    let failing: Vec<&str> = exec
        .result
        .conditions
        .iter()
        .filter(|c| c.is_failing())
        .map(|c| c.message.as_str())
        .collect();
    if failing.is_empty() {
        exec.result
            .conditions
            .first()
            .map(|c| c.message.clone())
            .unwrap_or_default()
    } else {
        failing.join("; ")
    }
}

pub(super) fn lint(report: &LintReport) -> String {
    let mut out = format!(
        "Current version: {}\nTarget version:  {}\n\n",
        report.current_version, report.target_version
    );
    let rows: Vec<Vec<String>> = report
        .checks
        .iter()
        .map(|e| {
            vec![
                e.result.group.to_string(),
                e.result.kind.clone(),
                e.result.name.clone(),
                status(e).to_string(),
                message(e),
            ]
        })
        .collect();
    if rows.is_empty() {
        out.push_str("No applicable checks.\n");
    } else {
        out.push_str(&grid(&["GROUP", "KIND", "CHECK", "STATUS", "MESSAGE"], &rows));
    }
    let s = &report.summary;
    let _ = writeln!(
        out,
        "\n{} checks: {} passed, {} blocking, {} advisory, {} errors",
        s.total, s.passed, s.blocking, s.advisory, s.errors
    );
    if !report.skipped_kinds.is_empty() {
        let _ = writeln!(out, "Skipped workload kinds: {}", report.skipped_kinds.join(", "));
    }
    out
}

pub(super) fn migrations(items: &[MigrationInfo]) -> String {
    if items.is_empty() {
        return "No migrations available.\n".to_string();
    }
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|m| vec![m.id.clone(), m.group.to_string(), m.description.clone()])
        .collect();
    grid(&["ID", "GROUP", "DESCRIPTION"], &rows)
}

pub(super) fn migration_outcome(report: &MigrationReport) -> String {
    let mode = if report.dry_run { " (dry run)" } else { "" };
    let mut out = String::new();
    match &report.halted {
        Some(h) => {
            let _ = writeln!(
                out,
                "Halted at {} ({}): {}{mode}",
                h.rule,
                h.phase.as_str(),
                h.reason
            );
        }
        None => {
            let _ = writeln!(out, "{} action(s) completed{mode}", report.results.len());
        }
    }
    if !report.not_attempted.is_empty() {
        let _ = writeln!(out, "Not attempted: {}", report.not_attempted.join(", "));
    }
    out
}
