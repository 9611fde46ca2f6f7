//! Configuration System
//!
//! Layered configuration built with the `config` crate: built-in defaults, the
//! global file, workspace files and `RELAY__` environment overrides, validated
//! as a whole before use.

use crate::logging::LoggingConfig;
use crate::provider::ProviderConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

mod facade;
mod merge {
    pub mod merge_policy;
}
mod sources {
    pub mod global_file;
    pub mod workspace_file;
}

pub use facade::{ConfigLoader, API_KEY_VAR, ENV_PREFIX};
pub use sources::workspace_file::ENV_NAME_VAR;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Conversation store selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database directory for the sled backend
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Database directory: the configured path, or `conversations` under the
    /// platform data directory.
    pub fn resolved_path(&self) -> Result<PathBuf, String> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        ProjectDirs::from("", "", "support-relay")
            .map(|dirs| dirs.data_dir().join("conversations"))
            .ok_or_else(|| "Cannot determine a data directory; set storage.path".to_string())
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(path) = &self.path {
            if path.as_os_str().is_empty() {
                return Err("Storage path cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

/// One failed check from [`RelayConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Provider(String),
    Storage(String),
    Logging(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "[provider] {}", msg),
            ValidationError::Storage(msg) => write!(f, "[storage] {}", msg),
            ValidationError::Logging(msg) => write!(f, "[logging] {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl RelayConfig {
    /// Validate every section, collecting all errors.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.storage.validate() {
            errors.push(ValidationError::Storage(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
