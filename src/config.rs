//! Configuration for barangay-registry

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::RegistryError;

/// Minimum JWT secret length outside dev mode
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("barangay-registry")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the database and config file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// SQLite database file name inside `data_dir`
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Maximum pooled SQLite connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Host to bind the HTTP API to
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// HTTP API port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// HS256 secret for session tokens
    #[serde(default)]
    pub jwt_secret: String,

    /// Session token lifetime
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_seconds: u64,

    /// Development mode: bearer tokens are not required
    #[serde(default)]
    pub dev_mode: bool,

    /// Reject expenses that push a project past its total cost
    #[serde(default)]
    pub strict_budget: bool,

    /// Barangay identity printed on certificates and report headers
    #[serde(default = "default_barangay_name")]
    pub barangay_name: String,

    #[serde(default = "default_municipality")]
    pub municipality: String,

    #[serde(default = "default_province")]
    pub province: String,
}

fn default_database_file() -> String {
    "registry.db".to_string()
}

fn default_pool_size() -> u32 {
    8
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8088
}

fn default_jwt_expiry() -> u64 {
    8 * 60 * 60
}

fn default_barangay_name() -> String {
    "Barangay San Isidro".to_string()
}

fn default_municipality() -> String {
    "Quezon City".to_string()
}

fn default_province() -> String {
    "Metro Manila".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: default_database_file(),
            pool_size: default_pool_size(),
            bind_host: default_bind_host(),
            http_port: default_http_port(),
            jwt_secret: String::new(),
            jwt_expiry_seconds: default_jwt_expiry(),
            dev_mode: false,
            strict_budget: false,
            barangay_name: default_barangay_name(),
            municipality: default_municipality(),
            province: default_province(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Get config file path
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    /// Check settings that would make the server unsafe to run
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.pool_size == 0 {
            return Err(RegistryError::Config("pool_size must be at least 1".into()));
        }
        if !self.dev_mode && self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(RegistryError::Config(format!(
                "jwt_secret must be at least {} characters (or enable dev_mode)",
                MIN_JWT_SECRET_LEN
            )));
        }
        if self.jwt_expiry_seconds == 0 {
            return Err(RegistryError::Config("jwt_expiry_seconds must be positive".into()));
        }
        Ok(())
    }

    /// One-line barangay address for document headers
    pub fn locality_line(&self) -> String {
        format!("{}, {}, {}", self.barangay_name, self.municipality, self.province)
    }
}
