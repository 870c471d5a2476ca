use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::debug;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Application configuration structure that defines all runtime parameters.
///
/// This structure holds the complete configuration for the service: network
/// binding, storage backend selection, pagination bounds and the CORS policy
/// for the dashboard. It is read from a TOML file (every field optional) and
/// then overridden by command-line flags or their environment variables.
///
/// # Examples
///
/// ```
/// use interface_monitor::configuration::config::Config;
///
/// let config = Config::from_toml_str("port = 8080\n[query]\nmax_page_size = 200").unwrap();
/// assert_eq!(config.port, 8080);
/// assert_eq!(config.query.default_page_size, 50);
/// ```
///
/// # Fields Overview
///
/// - `bind_address`: IP address the HTTP server listens on
/// - `port`: TCP port of the HTTP server
/// - `log_level`: default `env_logger` filter when `RUST_LOG` is unset
/// - `storage`: which record store to open and where
/// - `query`: default and maximum page size for list requests
/// - `cors`: browser origins allowed to call the API
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub bind_address: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub storage: StorageConfig,
    pub query: QueryConfig,
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            log_level: "info".to_string(),
            storage: StorageConfig::default(),
            query: QueryConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// Command-line flags shared by every binary. Each flag overrides the value
/// read from the configuration file.
#[derive(Parser, Debug, Clone, Default)]
pub struct CliArgs {
    /// Path of the TOML configuration file
    #[arg(short, long, env = "IFMON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "IFMON_BIND_ADDRESS")]
    pub bind_address: Option<IpAddr>,

    /// Port of the HTTP server
    #[arg(long, env = "IFMON_PORT")]
    pub port: Option<u16>,

    /// Record store backend
    #[arg(long, value_enum, env = "IFMON_STORAGE_BACKEND")]
    pub storage_backend: Option<StorageBackend>,

    /// SQLite database file used by the `database` backend
    #[arg(long, env = "IFMON_DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    /// Directory used by the `file` backend
    #[arg(long, env = "IFMON_FILE_STORAGE_DIR")]
    pub file_storage_dir: Option<PathBuf>,
}

impl Config {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Reading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Builds the effective configuration: file (if any), then CLI overrides.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(addr) = args.bind_address {
            config.bind_address = addr;
        }
        if let Some(port) = args.port {
            config.port = port;
        }
        if let Some(backend) = args.storage_backend {
            config.storage.backend = backend;
        }
        if let Some(path) = &args.database_path {
            config.storage.database_path = path.clone();
        }
        if let Some(dir) = &args.file_storage_dir {
            config.storage.file_storage_dir = dir.clone();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::NotInRange("port must be non-zero".to_string()));
        }
        if self.query.max_page_size == 0 {
            return Err(ConfigError::NotInRange(
                "query.max_page_size must be at least 1".to_string(),
            ));
        }
        if self.query.default_page_size == 0
            || self.query.default_page_size > self.query.max_page_size
        {
            return Err(ConfigError::NotInRange(format!(
                "query.default_page_size must be within 1..={}",
                self.query.max_page_size
            )));
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "unknown log_level `{}`",
                self.log_level
            )));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}
