//! Hierarchical step recording for actions.
//!
//! Every prepare/execute phase gets a fresh root recorder. Rules create nested steps with
//! [`StepRecorder::child`], seal them with [`StepRecorder::complete`] and attach structured
//! data with [`StepRecorder::add_detail`]. A parent's terminal status is whatever its author
//! sets; nothing is rolled up from children.
//!
//! Two implementations share one arena-backed tree:
//! - [`TreeRecorder`] only accumulates.
//! - [`StreamingRecorder`] also writes a line per step event to an output sink. The lines are
//!   produced by the same functions [`render::render_result`] uses, so the streamed text can be
//!   regenerated byte-for-byte from the built tree.
use serde_json::Value;

use crate::types::errors::Result;
use crate::types::{ActionResult, StepStatus};

mod arena;
pub mod render;
mod stream;
mod tree;

pub use stream::{SharedSink, StreamingRecorder};
pub use tree::TreeRecorder;

pub trait StepRecorder: Send + Sync {
    /// Create a nested step under this one and return its recorder.
    fn child(&self, name: &str, description: &str) -> Box<dyn StepRecorder>;

    /// Seal this step. Later calls on an already terminal step are ignored.
    fn complete(&self, status: StepStatus, message: &str);

    /// Attach a machine-readable detail to this step.
    fn add_detail(&self, key: &str, value: Value);

    /// Flag the enclosing action as cancelled by the operator; its result will report
    /// `completed = false` without any failed step.
    fn mark_cancelled(&self);

    /// Whether this recorder's tree runs in dry-run mode.
    fn dry_run(&self) -> bool;

    /// Return the accumulated tree. Only valid on a root recorder.
    ///
    /// # Errors
    /// Returns `Invalid` when called on a nested step recorder.
    fn build(&self) -> Result<ActionResult>;

    /// Create a child and immediately complete it.
    fn record(&self, name: &str, message: &str, status: StepStatus) {
        self.child(name, "").complete(status, message);
    }
}
