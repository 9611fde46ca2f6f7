//! Logging System
//!
//! Structured logging on top of `tracing`. Level, format and destination come
//! from (highest first) the `RELAY_LOG*` environment variables, the `[logging]`
//! config section, then defaults: `warn`, text, stderr. Stdout is left to
//! command output.

use crate::error::RelayError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

pub const ENV_LOG: &str = "RELAY_LOG";
pub const ENV_LOG_FORMAT: &str = "RELAY_LOG_FORMAT";
pub const ENV_LOG_OUTPUT: &str = "RELAY_LOG_OUTPUT";
pub const ENV_LOG_MODULES: &str = "RELAY_LOG_MODULES";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Set to false to install no subscriber at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output is "file"; defaults to the platform data dir
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Colored output (text format on a terminal only)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_format(&self.format)?;
        OutputDestination::parse(&self.output)?;
        Ok(())
    }

    /// Resolved log file path.
    pub fn log_file(&self) -> PathBuf {
        self.file.clone().unwrap_or_else(default_log_file)
    }
}

fn default_log_file() -> PathBuf {
    ProjectDirs::from("", "", "support-relay")
        .map(|dirs| dirs.data_local_dir().join("relay.log"))
        .unwrap_or_else(|| PathBuf::from(".support-relay/relay.log"))
}

/// Initialize the logging system
///
/// Calling this twice is an error; the first subscriber stays installed.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), RelayError> {
    if let Some(config) = config {
        if !config.enabled {
            return Ok(());
        }
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;
    let use_color = config.map(|c| c.color).unwrap_or(true) && output != OutputDestination::File;

    let writer = match output {
        OutputDestination::Stdout => BoxMakeWriter::new(std::io::stdout),
        OutputDestination::Stderr => BoxMakeWriter::new(std::io::stderr),
        OutputDestination::File => {
            let log_file = config
                .map(LoggingConfig::log_file)
                .unwrap_or_else(default_log_file);
            if let Some(parent) = log_file.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    RelayError::ConfigError(format!("Failed to create log directory: {}", e))
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .map_err(|e| {
                    RelayError::ConfigError(format!(
                        "Failed to open log file {}: {}",
                        log_file.display(),
                        e
                    ))
                })?;
            BoxMakeWriter::new(std::sync::Arc::new(file))
        }
    };

    let base_subscriber = Registry::default().with(filter);
    let installed = if format == "json" {
        base_subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init()
    } else {
        base_subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(writer),
            )
            .try_init()
    };

    installed.map_err(|e| RelayError::ConfigError(format!("Failed to install logger: {}", e)))
}

/// Build environment filter from config or environment variables
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, RelayError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_LOG) {
        return Ok(filter);
    }

    let level = config.map(|c| c.level.as_str()).unwrap_or("warn");
    if level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(level);

    if let Some(config) = config {
        for (module, module_level) in &config.modules {
            filter = filter.add_directive(parse_directive(module, module_level)?);
        }
    }

    if let Ok(modules) = std::env::var(ENV_LOG_MODULES) {
        for (module, module_level) in parse_module_levels(&modules) {
            filter = filter.add_directive(parse_directive(module, module_level)?);
        }
    }

    Ok(filter)
}

fn parse_directive(
    module: &str,
    level: &str,
) -> Result<tracing_subscriber::filter::Directive, RelayError> {
    format!("{}={}", module, level)
        .parse()
        .map_err(|e| RelayError::ConfigError(format!("Invalid log directive: {}", e)))
}

/// Parse `module=level` pairs separated by commas; malformed pairs are skipped.
fn parse_module_levels(spec: &str) -> Vec<(&str, &str)> {
    spec.split(',')
        .filter_map(|pair| {
            let (module, level) = pair.split_once('=')?;
            let (module, level) = (module.trim(), level.trim());
            (!module.is_empty() && !level.is_empty()).then_some((module, level))
        })
        .collect()
}

fn validate_format(format: &str) -> Result<(), String> {
    if format == "json" || format == "text" {
        Ok(())
    } else {
        Err(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            format
        ))
    }
}

/// Determine output format from config or environment
fn determine_format(config: Option<&LoggingConfig>) -> Result<String, RelayError> {
    resolve_format(std::env::var(ENV_LOG_FORMAT).ok(), config)
}

/// The environment value wins over the config; either one must be valid.
fn resolve_format(
    env_value: Option<String>,
    config: Option<&LoggingConfig>,
) -> Result<String, RelayError> {
    let format = env_value
        .unwrap_or_else(|| config.map(|c| c.format.clone()).unwrap_or_else(|| "text".into()));
    validate_format(&format).map_err(RelayError::ConfigError)?;
    Ok(format)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputDestination {
    Stdout,
    Stderr,
    File,
}

impl OutputDestination {
    fn parse(output: &str) -> Result<Self, String> {
        match output {
            "stdout" => Ok(OutputDestination::Stdout),
            "stderr" => Ok(OutputDestination::Stderr),
            "file" => Ok(OutputDestination::File),
            _ => Err(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
                output
            )),
        }
    }
}

fn determine_output(config: Option<&LoggingConfig>) -> Result<OutputDestination, RelayError> {
    resolve_output(std::env::var(ENV_LOG_OUTPUT).ok(), config)
}

fn resolve_output(
    env_value: Option<String>,
    config: Option<&LoggingConfig>,
) -> Result<OutputDestination, RelayError> {
    let output = env_value
        .unwrap_or_else(|| config.map(|c| c.output.clone()).unwrap_or_else(|| "stderr".into()));
    OutputDestination::parse(&output).map_err(RelayError::ConfigError)
}
