//! Minimal W3C `traceparent` propagation for outbound calls.

use http::{HeaderMap, HeaderValue};
use tracing::Span;

pub const TRACEPARENT: &str = "traceparent";

/// `00-<trace-id>-<parent-id>-01`; the parent id is the span id when the span is enabled.
pub fn make_traceparent(span: &Span) -> String {
    let trace_id: u128 = rand::random();
    let parent_id = span
        .id()
        .map(|id| id.into_u64())
        .unwrap_or_else(rand::random::<u64>);
    format!("00-{trace_id:032x}-{parent_id:016x}-01")
}

/// Insert a `traceparent` header unless the caller already set one.
pub fn inject_trace_context(headers: &mut HeaderMap, span: &Span) {
    if headers.contains_key(TRACEPARENT) {
        return;
    }
    if let Ok(v) = HeaderValue::from_str(&make_traceparent(span)) {
        headers.insert(TRACEPARENT, v);
    }
}

/// Trace id part of a `traceparent` value.
pub fn parse_trace_id(traceparent: &str) -> Option<&str> {
    let mut parts = traceparent.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("00"), Some(trace), Some(_), Some(_)) if trace.len() == 32 => Some(trace),
        _ => None,
    }
}
