use crate::types::errors::{Error, ErrorKind};

use super::ApiError;

/// Map an error returned by an action phase to the top-level error for rule `rule_id`.
#[must_use]
pub fn map_rule_error(rule_id: &str, e: &Error) -> ApiError {
    match e.kind {
        ErrorKind::Timeout => ApiError::Timeout(format!("{rule_id}: {}", e.msg)),
        _ => ApiError::MigrationFailed(format!("{rule_id}: {e}")),
    }
}
