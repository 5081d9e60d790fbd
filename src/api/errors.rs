use thiserror::Error;

use crate::registry::RegistryError;

mod map;

pub use map::map_rule_error;

/// Top-level errors. Every variant's message carries the operation it came from, so nothing
/// reaches the terminal unannotated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("selecting rules: {0}")]
    Selection(String),
    #[error("unknown rule id: {0}")]
    UnknownRule(String),
    #[error("detecting cluster version: {0}")]
    Detect(String),
    #[error("migration failed: {0}")]
    MigrationFailed(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("i/o: {0}")]
    Io(String),
    #[error("step recorder: {0}")]
    Recorder(String),
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(id) => ApiError::UnknownRule(id),
            other => ApiError::Selection(other.to_string()),
        }
    }
}

impl ApiError {
    #[must_use]
    pub const fn id(&self) -> ErrorId {
        match self {
            ApiError::Selection(_) => ErrorId::E_SELECTION,
            ApiError::UnknownRule(_) => ErrorId::E_UNKNOWN_RULE,
            ApiError::Detect(_) => ErrorId::E_DETECT,
            ApiError::MigrationFailed(_) | ApiError::Recorder(_) => ErrorId::E_MIGRATION,
            ApiError::Timeout(_) => ErrorId::E_TIMEOUT,
            ApiError::Io(_) => ErrorId::E_GENERIC,
        }
    }

    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        exit_code_for(self.id())
    }
}

// Stable identifiers stamped on facts as `error_id`.
// SCREAMING_SNAKE_CASE matches the emitted strings.
#[allow(non_camel_case_types, reason = "Error IDs match their emitted string form")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorId {
    E_SELECTION,
    E_UNKNOWN_RULE,
    E_BLOCKING,
    E_ADVISORY,
    E_MIGRATION,
    E_DETECT,
    E_TIMEOUT,
    E_GENERIC,
}

#[must_use]
pub const fn id_str(id: ErrorId) -> &'static str {
    match id {
        ErrorId::E_SELECTION => "E_SELECTION",
        ErrorId::E_UNKNOWN_RULE => "E_UNKNOWN_RULE",
        ErrorId::E_BLOCKING => "E_BLOCKING",
        ErrorId::E_ADVISORY => "E_ADVISORY",
        ErrorId::E_MIGRATION => "E_MIGRATION",
        ErrorId::E_DETECT => "E_DETECT",
        ErrorId::E_TIMEOUT => "E_TIMEOUT",
        ErrorId::E_GENERIC => "E_GENERIC",
    }
}

#[must_use]
pub const fn exit_code_for(id: ErrorId) -> i32 {
    match id {
        ErrorId::E_SELECTION => 10,
        ErrorId::E_UNKNOWN_RULE => 11,
        ErrorId::E_BLOCKING => 20,
        ErrorId::E_ADVISORY => 21,
        ErrorId::E_MIGRATION => 30,
        ErrorId::E_DETECT => 40,
        ErrorId::E_TIMEOUT => 50,
        ErrorId::E_GENERIC => 1,
    }
}
