//! Server configuration.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! command-line flags or their environment variables.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Backing JSON document for the patient collection
    pub data_file: PathBuf,
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            data_file: PathBuf::from("patient.json"),
            log_filter: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file. Keys left out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Command-line interface.
#[derive(Debug, Default, Parser)]
#[command(name = "patient-records", version, about = "Patient record HTTP API")]
pub struct Cli {
    /// TOML config file
    #[arg(long, env = "PATIENT_RECORDS_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "PATIENT_RECORDS_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "PATIENT_RECORDS_PORT")]
    pub port: Option<u16>,

    /// Backing JSON document
    #[arg(long, env = "PATIENT_RECORDS_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Log filter, e.g. `info` or `patient_records_core=debug`
    #[arg(long, env = "PATIENT_RECORDS_LOG")]
    pub log_filter: Option<String>,
}

impl Cli {
    /// Build the effective configuration.
    pub fn resolve(self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(data_file) = self.data_file {
            config.data_file = data_file;
        }
        if let Some(log_filter) = self.log_filter {
            config.log_filter = log_filter;
        }

        Ok(config)
    }
}
