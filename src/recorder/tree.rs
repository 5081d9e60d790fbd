use serde_json::Value;

use crate::types::errors::Result;
use crate::types::{ActionMetadata, ActionResult, ActionSpec, StepStatus};

use super::arena::Cursor;
use super::StepRecorder;

/// Accumulating recorder; nothing is written until the tree is built and rendered.
#[derive(Clone)]
pub struct TreeRecorder {
    cursor: Cursor,
}

impl TreeRecorder {
    #[must_use]
    pub fn root(metadata: ActionMetadata, spec: ActionSpec) -> Self {
        Self {
            cursor: Cursor::root(metadata, spec),
        }
    }
}

impl StepRecorder for TreeRecorder {
    fn child(&self, name: &str, description: &str) -> Box<dyn StepRecorder> {
        Box::new(Self {
            cursor: self.cursor.add_child(name, description),
        })
    }

    fn complete(&self, status: StepStatus, message: &str) {
        let _ = self.cursor.complete(status, message);
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
