//! Configuration management for the FileBox server
//!
//! Loads `config.toml` with environment overrides, validates it, and
//! falls back to built-in defaults when no file is present.

use ::config::{Config, ConfigError, Environment, File};
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Server configuration, loaded once at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind the command listener.
    pub bind_address: String,

    /// Port for the command listener.
    pub control_port: u16,

    /// Base directory holding one namespace root per user.
    pub storage_root: String,

    /// Maximum concurrent authenticated clients.
    pub max_clients: usize,

    /// Maximum upload size in MB.
    pub max_file_size_mb: u64,

    /// Maximum command line length in bytes.
    pub max_command_length: usize,

    /// Credential table for the in-memory authenticator.
    #[serde(default)]
    pub users: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            control_port: 2121,
            storage_root: "./storage_root".to_string(),
            max_clients: 10,
            max_file_size_mb: 100,
            max_command_length: 512,
            users: HashMap::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides.
    /// Tries the packaged path first, then the working directory, then
    /// falls back to defaults.
    pub fn load() -> Self {
        let config_paths = ["filebox-server/config", "config"];

        for config_path in &config_paths {
            match Config::builder()
                .add_source(File::with_name(config_path))
                .add_source(Environment::with_prefix("FILEBOX"))
                .build()
                .and_then(|settings| settings.try_deserialize::<ServerConfig>())
            {
                Ok(config) => match config.validate() {
                    Ok(()) => return config,
                    Err(e) => {
                        warn!("Rejecting config from {}: {}", config_path, e);
                    }
                },
                Err(_) => continue,
            }
        }

        warn!("No usable config.toml found; using built-in defaults");
        Self::default()
    }

    /// Validation for all configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_port == 0 {
            return Err(ConfigError::Message(
                "control_port cannot be 0".into(),
            ));
        }

        if self.storage_root.is_empty() {
            return Err(ConfigError::Message(
                "storage_root cannot be empty".into(),
            ));
        }

        if self.max_clients == 0 {
            return Err(ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_file_size_mb == 0 {
            return Err(ConfigError::Message(
                "max_file_size_mb must be greater than 0".into(),
            ));
        }

        if self.max_command_length < 32 {
            return Err(ConfigError::Message(
                "max_command_length must be at least 32".into(),
            ));
        }

        Ok(())
    }

    /// Bind address and control port as a socket address string.
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    /// Storage base directory as a path.
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Maximum upload size in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}
