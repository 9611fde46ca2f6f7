//! Configuration loading facade.

use super::merge::merge_policy;
use super::sources::{global_file, workspace_file};
use super::RelayConfig;
use crate::error::RelayError;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment prefix for overrides, e.g. `RELAY__PROVIDER__MODEL`.
pub const ENV_PREFIX: &str = "RELAY";
/// Provider key fallback read when `provider.api_key` is unset.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Loads [`RelayConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Layers, lowest first: defaults, global file, workspace files,
    /// `RELAY__` environment variables.
    pub fn load(workspace_root: &Path) -> Result<RelayConfig, RelayError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        Self::finish(builder)
    }

    /// Load from one explicit file in place of the global and workspace files.
    pub fn load_from_file(path: &Path) -> Result<RelayConfig, RelayError> {
        if !path.exists() {
            return Err(RelayError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let builder =
            merge_policy::builder_with_defaults()?.add_source(File::from(path).required(true));
        Self::finish(builder)
    }

    /// Path of the global config file, if a home directory is known.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<RelayConfig, RelayError> {
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        let mut config: RelayConfig = settings.try_deserialize()?;
        Self::apply_env_fallbacks(&mut config);

        config.validate().map_err(|errors| {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            RelayError::ConfigError(joined)
        })?;
        Ok(config)
    }

    fn apply_env_fallbacks(config: &mut RelayConfig) {
        if config.provider.api_key.is_some() {
            return;
        }
        if let Ok(key) = std::env::var(API_KEY_VAR) {
            if !key.trim().is_empty() {
                debug!("Using {} for provider api key", API_KEY_VAR);
                config.provider.api_key = Some(key);
            }
        }
    }
}
