use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

pub const TS_ZERO: &str = "1970-01-01T00:00:00Z";

pub fn now_iso() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| TS_ZERO.to_string())
}

/// Return a timestamp for facts emission based on mode.
/// - dry-run: constant zero timestamp for determinism.
/// - otherwise: real, current timestamp in RFC3339.
#[must_use]
pub fn ts_for_mode(dry_run: bool) -> String {
    if dry_run {
        TS_ZERO.to_string()
    } else {
        now_iso()
    }
}

/// Apply redactions to a fact event for comparison and safe logging.
/// Zeroes timestamps, removes timings and attempt counters, and masks preserved configuration
/// payloads, which may carry credentials copied out of the cluster.
#[must_use]
pub fn redact_event(mut v: Value) -> Value {
    if let Some(obj) = v.as_object_mut() {
        obj.insert("ts".into(), Value::String(TS_ZERO.to_string()));
        obj.remove("duration_ms");
        obj.remove("attempts");
        if obj.contains_key("preserved_config") {
            obj.insert("preserved_config".into(), Value::String("***".into()));
        }
    }
    v
}
