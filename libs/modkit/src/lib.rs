//! # ModKit - module toolkit for the CourseHub server
//!
//! Feature modules implement a small set of capability traits and are wired
//! by the runner in explicit order:
//!
//! init → db (migrations) → rest (router composition) → start → stop
//!
//! ```rust,ignore
//! let registry = ModuleRegistry::builder()
//!     .module("api_ingress", ingress.clone()).rest_host(ingress.clone()).stateful(ingress)
//!     .module("accounts", accounts.clone()).db(accounts.clone()).rest(accounts)
//!     .build()?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

// Module system exports
pub mod contracts;
pub use contracts::*;

pub mod context;
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};

pub mod client_hub;
pub use client_hub::ClientHub;

pub mod registry;
pub use registry::{ModuleRegistry, RegistryBuilder, RegistryError};

// HTTP API helpers
pub mod api;
pub use api::json::JsonBody;
pub use api::problem::{internal_error, unauthorized, Problem, ProblemResponse};
pub use api::response::{Detail, PageDto, PageQuery};

pub mod security;
pub use security::{Authenticated, Principal, Role, TokenAuthenticator};

pub mod http;
pub use http::client::TracedClient;

pub mod lifecycle;
pub mod runtime;

pub use lifecycle::{Lifecycle, Status, StopReason};
pub use runtime::{run, RunOptions, ShutdownOptions};
