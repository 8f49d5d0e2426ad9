pub mod error;
pub mod permissions;
pub mod ports;
pub mod repo;
pub mod service;
