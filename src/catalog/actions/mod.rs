use crate::recorder::StepRecorder;
use crate::types::errors::Error;
use crate::types::StepStatus;

mod backup;
mod kserve_raw;

pub use backup::PlatformConfigBackup;
pub use kserve_raw::KserveRawDeployment;

/// Seal `step` as failed with the error text and hand the error back with context.
fn fail(step: &dyn StepRecorder, err: Error, what: &str) -> Error {
    step.complete(StepStatus::Failed, &err.msg);
    err.context(what)
}
