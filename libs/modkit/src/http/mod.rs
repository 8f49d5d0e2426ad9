//! Outbound HTTP helpers.

pub mod client;
pub mod trace_context;
