//! CLI route: single route table and run context. Dispatches to the chat
//! service and presentation.

use crate::chat::ChatService;
use crate::cli::output::map_error;
use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_chat_reply, format_health, format_history};
use crate::cli::command_name;
use crate::config::{ConfigLoader, RelayConfig, StorageBackend};
use crate::conversation::{
    ConversationId, ConversationStoreRef, InMemoryConversationStore, SledConversationStore,
};
use crate::error::{RelayError, StorageError};
use crate::generation::ResponseOrchestrator;
use crate::provider::{GeminiClient, GenerationClientRef};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Runtime context for CLI execution: the async runtime and the chat service.
pub struct RunContext {
    runtime: Runtime,
    service: ChatService,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, RelayError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Self::from_config(&config)
    }

    /// Open the configured store and provider client.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        let store: ConversationStoreRef = match config.storage.backend {
            StorageBackend::Sled => {
                let path = config
                    .storage
                    .resolved_path()
                    .map_err(RelayError::ConfigError)?;
                std::fs::create_dir_all(&path).map_err(StorageError::IoError)?;
                debug!(path = %path.display(), "Opening conversation store");
                Arc::new(SledConversationStore::open(&path)?)
            }
            StorageBackend::Memory => Arc::new(InMemoryConversationStore::new()),
        };
        let client = GeminiClient::new(&config.provider)?;
        Self::with_parts(store, Arc::new(client))
    }

    /// Build from an already constructed store and client.
    pub fn with_parts(
        store: ConversationStoreRef,
        client: GenerationClientRef,
    ) -> Result<Self, RelayError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| RelayError::ConfigError(format!("Failed to create runtime: {}", e)))?;
        let service = ChatService::new(store, ResponseOrchestrator::new(client));
        Ok(Self { runtime, service })
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, RelayError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, RelayError> {
        match command {
            Commands::Send {
                message,
                session,
                format,
            } => {
                let reply = self
                    .runtime
                    .block_on(self.service.send_message(*session, message))?;
                format_chat_reply(&reply, *format)
            }
            Commands::Chat { session } => self.run_chat(*session),
            Commands::History { session, format } => {
                let history = self.runtime.block_on(self.service.history(*session))?;
                format_history(&history, *format)
            }
            Commands::Health { format } => {
                let report = self.runtime.block_on(self.service.health());
                let rendered = format_health(&report, *format)?;
                if report.status_code() == 200 {
                    Ok(rendered)
                } else {
                    Err(RelayError::Unhealthy(rendered))
                }
            }
        }
    }

    /// Interactive loop. Failed sends are reported and the loop continues.
    fn run_chat(&self, mut session: Option<ConversationId>) -> Result<String, RelayError> {
        use dialoguer::Input;

        if let Some(id) = session {
            // Surface an unknown session before the first prompt.
            self.runtime.block_on(self.service.history(id))?;
        }
        println!(
            "{}",
            "Chatting with support. Type `exit` or press enter on an empty line to quit.".dimmed()
        );

        let mut exchanged = 0usize;
        loop {
            let line: String = Input::new()
                .with_prompt("you")
                .allow_empty(true)
                .interact_text()?;
            let line = line.trim();
            if line.is_empty() || line.eq_ignore_ascii_case("exit") {
                break;
            }

            match self.runtime.block_on(self.service.send_message(session, line)) {
                Ok(reply) => {
                    session = Some(reply.session_id);
                    exchanged += 1;
                    println!("{} {}", "agent:".cyan().bold(), reply.reply);
                }
                Err(e) => eprintln!("{}", map_error(&e).red()),
            }
        }

        Ok(match session {
            Some(id) => format!("Session {} ended after {} exchange(s).", id, exchanged),
            None => "No messages sent.".to_string(),
        })
    }
}
