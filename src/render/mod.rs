//! Output renderers.
//!
//! Every renderer consumes results in the order the engine produced them. Lint results arrive
//! pre-sorted; nothing here sorts again, so all three formats list rows identically.
use std::fmt::{self, Write as _};
use std::str::FromStr;

use serde::Serialize;

use crate::api::{LintReport, MigrationInfo, MigrationReport};
use crate::recorder::render::render_result;
use crate::types::errors::Result;

mod table;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!("unknown output format `{other}` (expected table, json or yaml)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Yaml => "yaml",
        })
    }
}

fn structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<Option<String>> {
    Ok(match format {
        OutputFormat::Table => None,
        OutputFormat::Json => Some(serde_json::to_string_pretty(value)? + "\n"),
        OutputFormat::Yaml => Some(serde_yaml::to_string(value)?),
    })
}

/// # Errors
/// Serialization errors for JSON/YAML output.
pub fn render_lint(report: &LintReport, format: OutputFormat) -> Result<String> {
    match structured(report, format)? {
        Some(s) => Ok(s),
        None => Ok(table::lint(report)),
    }
}

/// # Errors
/// Serialization errors for JSON/YAML output.
pub fn render_migrations(items: &[MigrationInfo], format: OutputFormat) -> Result<String> {
    match structured(items, format)? {
        Some(s) => Ok(s),
        None => Ok(table::migrations(items)),
    }
}

/// Table output is the step tree of every action followed by a one-line outcome.
///
/// # Errors
/// Serialization errors for JSON/YAML output.
pub fn render_migration_report(report: &MigrationReport, format: OutputFormat) -> Result<String> {
    if let Some(s) = structured(report, format)? {
        return Ok(s);
    }
    let mut out = String::new();
    for r in &report.results {
        let _ = writeln!(out, "{} [{}]", r.metadata.name, r.metadata.kind);
        out.push_str(&render_result(r, "  "));
    }
    out.push_str(&table::migration_outcome(report));
    Ok(out)
}

/// The closing summary of a migration run, for callers that already streamed the steps.
#[must_use]
pub fn render_migration_outcome(report: &MigrationReport) -> String {
    table::migration_outcome(report)
}
