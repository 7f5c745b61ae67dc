//! W3C trace context.
//!
//! Parses `traceparent` (`{version}-{trace-id}-{parent-id}-{flags}`) or mints
//! fresh ids when the header is absent or malformed. Each service hop gets
//! its own span id; the incoming parent id is kept for log correlation.

use axum::http::HeaderMap;
use rand::Rng;
use uuid::Uuid;

pub const TRACEPARENT: &str = "traceparent";
pub const X_TRACE_ID: &str = "x-trace-id";

/// Log placeholders for requests that never passed the trace middleware.
pub const UNKNOWN_TRACE_ID: &str = "unknown-trace-id";
pub const UNKNOWN_SPAN_ID: &str = "unknown-span-id";

const TRACE_ID_LEN: usize = 32;
const SPAN_ID_LEN: usize = 16;

/// Trace identifiers for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceIds {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub sampled: bool,
}

impl TraceIds {
    /// Start a new trace.
    pub fn generate() -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string(),
            span_id: new_span_id(),
            parent_span_id: None,
            sampled: true,
        }
    }

    /// Continue the trace described by a `traceparent` value.
    pub fn from_traceparent(value: &str) -> Option<Self> {
        let parts: Vec<&str> = value.trim().split('-').collect();
        if parts.len() < 4 {
            return None;
        }
        let (version, trace_id, parent_id, flags) = (parts[0], parts[1], parts[2], parts[3]);

        if !is_lower_hex(version, 2) || version == "ff" || (version == "00" && parts.len() != 4) {
            return None;
        }
        if !is_hex_id(trace_id, TRACE_ID_LEN) || !is_hex_id(parent_id, SPAN_ID_LEN) {
            return None;
        }
        if !is_lower_hex(flags, 2) {
            return None;
        }
        let flag_bits = u8::from_str_radix(flags, 16).ok()?;

        Some(Self {
            trace_id: trace_id.to_string(),
            span_id: new_span_id(),
            parent_span_id: Some(parent_id.to_string()),
            sampled: flag_bits & 0x01 == 0x01,
        })
    }

    /// Use the incoming header when valid, otherwise start a new trace.
    pub fn extract(headers: &HeaderMap) -> Self {
        headers
            .get(TRACEPARENT)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::from_traceparent)
            .unwrap_or_else(Self::generate)
    }

    /// `traceparent` value for calls made on behalf of this request.
    pub fn traceparent(&self) -> String {
        let flags = if self.sampled { "01" } else { "00" };
        format!("00-{}-{}-{}", self.trace_id, self.span_id, flags)
    }
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Lowercase hex of the given length, not all zeros.
fn is_hex_id(s: &str, len: usize) -> bool {
    is_lower_hex(s, len) && s.bytes().any(|b| b != b'0')
}

fn new_span_id() -> String {
    format!("{:016x}", rand::thread_rng().gen_range(1..=u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    #[test]
    fn test_parse_valid_traceparent() {
        let ids = TraceIds::from_traceparent(VALID).unwrap();
        assert_eq!(ids.trace_id, "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(ids.parent_span_id.as_deref(), Some("00f067aa0ba902b7"));
        assert_ne!(ids.span_id, "00f067aa0ba902b7");
        assert_eq!(ids.span_id.len(), 16);
        assert!(ids.sampled);
    }

    #[test]
    fn test_rejects_malformed_values() {
        for value in [
            "",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
            "ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
            "00-4BF92F3577B34DA6A3CE929D0E0E4736-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-extra",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-1",
        ] {
            assert!(TraceIds::from_traceparent(value).is_none(), "{value}");
        }
    }

    #[test]
    fn test_future_version_may_carry_extra_fields() {
        let value = "01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00-future";
        let ids = TraceIds::from_traceparent(value).unwrap();
        assert!(!ids.sampled);
    }

    #[test]
    fn test_extract_generates_when_missing() {
        let ids = TraceIds::extract(&HeaderMap::new());
        assert_eq!(ids.trace_id.len(), 32);
        assert!(ids.parent_span_id.is_none());
    }

    #[test]
    fn test_traceparent_round_trips_trace_id() {
        let ids = TraceIds::generate();
        let next_hop = TraceIds::from_traceparent(&ids.traceparent()).unwrap();
        assert_eq!(next_hop.trace_id, ids.trace_id);
        assert_eq!(next_hop.parent_span_id.as_deref(), Some(ids.span_id.as_str()));
    }
}
