use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use log::Level;
use serde_json::{json, Value};

pub trait FactsEmitter {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value);
}

pub trait AuditSink {
    fn log(&self, level: Level, msg: &str);
}

/// Facts as JSON lines. The default instance discards everything.
#[derive(Default)]
pub struct JsonlSink {
    out: Option<Mutex<File>>,
}

impl JsonlSink {
    /// Append facts to `path`, creating it if needed.
    ///
    /// # Errors
    /// Returns the I/O error when the file cannot be opened.
    pub fn to_path(path: &Path) -> std::io::Result<Self> {
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            out: Some(Mutex::new(f)),
        })
    }
}

impl FactsEmitter for JsonlSink {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value) {
        let Some(out) = &self.out else {
            return;
        };
        let mut line = json!({
            "subsystem": subsystem,
            "event": event,
            "decision": decision,
        });
        if let (Some(obj), Some(extra)) = (line.as_object_mut(), fields.as_object()) {
            for (k, v) in extra {
                obj.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        let mut f = out.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(f, "{line}");
    }
}

impl AuditSink for JsonlSink {
    fn log(&self, _level: Level, _msg: &str) {}
}

/// Audit lines through the `log` facade under the `waypoint` target.
/// Filtering and formatting belong to whatever logger the binary installs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAudit;

impl AuditSink for LogAudit {
    fn log(&self, level: Level, msg: &str) {
        log::log!(target: "waypoint", level, "{msg}");
    }
}
