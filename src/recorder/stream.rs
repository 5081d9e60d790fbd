use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::types::errors::Result;
use crate::types::{ActionMetadata, ActionResult, ActionSpec, StepStatus};

use super::arena::Cursor;
use super::render::{footer_line, header_line};
use super::StepRecorder;

/// Output shared by every streaming recorder of a run.
pub type SharedSink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Recorder that writes each step event as it happens, in addition to building the tree.
#[derive(Clone)]
pub struct StreamingRecorder {
    cursor: Cursor,
    sink: SharedSink,
    prefix: Arc<str>,
}

impl StreamingRecorder {
    #[must_use]
    pub fn root(
        metadata: ActionMetadata,
        spec: ActionSpec,
        sink: SharedSink,
        prefix: &str,
    ) -> Self {
        Self {
            cursor: Cursor::root(metadata, spec),
            sink,
            prefix: Arc::from(prefix),
        }
    }

    /// Wrap any writer as a sink that can be shared across recorders.
    #[must_use]
    pub fn sink<W: Write + Send + 'static>(w: W) -> SharedSink {
        Arc::new(Mutex::new(Box::new(w)))
    }

    fn write(&self, line: &str) {
        let mut w = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        // a broken output stream must not fail the action itself
        let _ = w.write_all(line.as_bytes());
        let _ = w.flush();
    }
}

impl StepRecorder for StreamingRecorder {
    fn child(&self, name: &str, description: &str) -> Box<dyn StepRecorder> {
        let depth = self.cursor.child_depth();
        let cursor = self.cursor.add_child(name, description);
        self.write(&header_line(&self.prefix, depth, name, description));
        Box::new(Self {
            cursor,
            sink: Arc::clone(&self.sink),
            prefix: Arc::clone(&self.prefix),
        })
    }

    fn complete(&self, status: StepStatus, message: &str) {
        if self.cursor.complete(status, message).is_some() {
            self.write(&footer_line(&self.prefix, self.cursor.own_depth(), status, message));
        }
    }

    fn add_detail(&self, key: &str, value: Value) {
        self.cursor.add_detail(key, value);
    }

    fn mark_cancelled(&self) {
        self.cursor.mark_cancelled();
    }

    fn dry_run(&self) -> bool {
        self.cursor.dry_run()
    }

    fn build(&self) -> Result<ActionResult> {
        self.cursor.build()
    }
}
