pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    AppConfig, AppConfigProvider, CliArgs, DatabaseConfig, LoggingConfig, Section, ServerConfig,
};
