//! Text rendering of step trees.
//!
//! A step prints a header when it starts and a footer when it reaches a terminal status.
//! Rendering a built [`ActionResult`] replays its transcript, so sibling steps that were open
//! at the same time print in the order they were recorded. Results without a transcript
//! render pre-order: header, children, footer.
use std::fmt::Write as _;

use crate::types::{ActionResult, ActionStep, StepStatus};

#[must_use]
pub fn glyph(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Completed => "✓",
        StepStatus::Failed => "✗",
        StepStatus::Skipped => "⊘",
        StepStatus::Pending => "·",
        StepStatus::Running => "→",
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

#[must_use]
pub fn header_line(prefix: &str, depth: usize, name: &str, description: &str) -> String {
    let mut line = format!("{prefix}{}{} {name}", indent(depth), glyph(StepStatus::Running));
    if !description.is_empty() {
        let _ = write!(line, " ({description})");
    }
    line.push('\n');
    line
}

#[must_use]
pub fn footer_line(prefix: &str, depth: usize, status: StepStatus, message: &str) -> String {
    let text = if message.is_empty() {
        status.as_str()
    } else {
        message
    };
    format!("{prefix}{}  {} {text}\n", indent(depth), glyph(status))
}

fn render_step(out: &mut String, prefix: &str, depth: usize, step: &ActionStep) {
    out.push_str(&header_line(prefix, depth, &step.name, &step.description));
    for c in &step.children {
        render_step(out, prefix, depth + 1, c);
    }
    if step.status.is_terminal() {
        out.push_str(&footer_line(prefix, depth, step.status, &step.message));
    }
}

/// Render every step of `result`, each line starting with `prefix`.
#[must_use]
pub fn render_result(result: &ActionResult, prefix: &str) -> String {
    let mut out = String::new();
    let status = &result.status;
    if status.transcript.is_empty() {
        for s in &status.steps {
            render_step(&mut out, prefix, 0, s);
        }
        return out;
    }
    for ev in &status.transcript {
        let Some(step) = status.step_at(&ev.path) else {
            continue;
        };
        let depth = ev.path.len().saturating_sub(1);
        if ev.closed {
            out.push_str(&footer_line(prefix, depth, step.status, &step.message));
        } else {
            out.push_str(&header_line(prefix, depth, &step.name, &step.description));
        }
    }
    out
}
