//! CLI parse: clap types for the relay. No behavior; definitions only.

use crate::conversation::ConversationId;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Support relay CLI - customer-support chat backed by a generative model
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Customer-support chat relay with retrying AI replies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (replaces global and workspace config files)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one message and print the reply
    Send {
        /// Customer message
        message: String,
        /// Continue an existing session
        #[arg(long)]
        session: Option<ConversationId>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Interactive chat; type `exit` or an empty line to quit
    Chat {
        /// Continue an existing session
        #[arg(long)]
        session: Option<ConversationId>,
    },
    /// Show the transcript of a session
    History {
        /// Session id
        session: ConversationId,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Check storage connectivity
    Health {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}
