pub mod error;
pub mod password;
pub mod repo;
pub mod service;
pub mod token;
