//! HTTP API building blocks shared by feature modules: RFC 9457 problem
//! responses, the JSON body extractor and common response envelopes.

pub mod json;
pub mod problem;
pub mod response;
