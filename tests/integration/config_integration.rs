//! Integration tests for building a run context from configuration files

use std::sync::Mutex;
use support_relay::cli::{Commands, OutputFormat, RunContext};
use support_relay::config::{ConfigLoader, StorageBackend, API_KEY_VAR};
use tempfile::TempDir;

/// Serializes tests that read or write process environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("relay.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn explicit_config_builds_memory_backed_context() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[provider]
api_key = "test-key"
model = "gemini-2.5-flash"

[storage]
backend = "memory"

[logging]
enabled = false
"#,
    );

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert!(!config.logging.enabled);

    let context = RunContext::new(dir.path().to_path_buf(), Some(path)).unwrap();
    let output = context
        .execute(&Commands::Health {
            format: OutputFormat::Json,
        })
        .unwrap();
    let report: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(report["status"], "healthy");
    assert_eq!(report["provider"], "gemini");
    assert_eq!(report["model"], "gemini-2.5-flash");
}

#[test]
fn sled_backend_opens_configured_path() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("data").join("conversations");
    let path = write_config(
        &dir,
        &format!(
            "[provider]\napi_key = \"test-key\"\n\n[storage]\nbackend = \"sled\"\npath = {:?}\n",
            db_path.to_string_lossy()
        ),
    );

    let context = RunContext::new(dir.path().to_path_buf(), Some(path)).unwrap();
    assert!(db_path.exists());
    let output = context
        .execute(&Commands::Health {
            format: OutputFormat::Text,
        })
        .unwrap();
    assert!(output.contains("connected"));
}

#[test]
fn missing_api_key_is_a_configuration_error() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved = std::env::var(API_KEY_VAR).ok();
    std::env::remove_var(API_KEY_VAR);

    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[storage]\nbackend = \"memory\"\n");
    let result = RunContext::new(dir.path().to_path_buf(), Some(path));

    if let Some(key) = saved {
        std::env::set_var(API_KEY_VAR, key);
    }

    let err = match result {
        Ok(_) => panic!("context should not build without an API key"),
        Err(err) => err,
    };
    assert_eq!(err.status_code(), 500);
    assert!(err.to_string().contains("GEMINI_API_KEY"));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = ConfigLoader::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}
