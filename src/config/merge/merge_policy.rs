//! Merge rules: built-in defaults sit under every other layer.

use crate::provider::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("provider.model", DEFAULT_MODEL)?
        .set_default("provider.endpoint", DEFAULT_ENDPOINT)?
        .set_default("storage.backend", "sled")?
        .set_default("logging.level", "warn")?
        .set_default("logging.output", "stderr")
}
