//! Runtime configuration: TOML file plus command-line/environment overrides.
pub mod config;
pub mod types;

pub use config::{CliArgs, Config};
pub use types::StorageBackend;
