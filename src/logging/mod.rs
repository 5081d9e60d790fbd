pub mod audit;
pub mod facts;
pub mod redact;

pub use audit::{AuditCtx, AuditMode, Decision, EventBuilder, Stage, StageLogger};
pub use facts::{AuditSink, FactsEmitter, JsonlSink, LogAudit};
pub use redact::{redact_event, ts_for_mode, TS_ZERO};
