// === PUBLIC CONTRACT ===
// Other modules talk to accounts only through `contract`.
pub mod contract;

pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::Accounts;

pub const MODULE_NAME: &str = "accounts";

// === INTERNAL MODULES ===
// Exposed for tests and the server's admin commands; not a stable API.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
