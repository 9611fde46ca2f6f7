//! CLI command-name contract for logging.

use crate::cli::parse::Commands;

/// Command name string for log fields (e.g. "send", "history").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Send { .. } => "send",
        Commands::Chat { .. } => "chat",
        Commands::History { .. } => "history",
        Commands::Health { .. } => "health",
    }
}
