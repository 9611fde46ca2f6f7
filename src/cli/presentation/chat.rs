//! Chat presentation: reply and transcript formatters.

use crate::chat::{ChatReply, ConversationHistory};
use crate::cli::parse::OutputFormat;
use crate::conversation::SENDER_USER;
use crate::error::RelayError;
use comfy_table::{ContentArrangement, Table};
use owo_colors::OwoColorize;

/// Transcript cells wrap at this width.
const MESSAGE_COLUMN_WIDTH: u16 = 100;

pub fn format_chat_reply(reply: &ChatReply, format: OutputFormat) -> Result<String, RelayError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reply)?),
        OutputFormat::Text => Ok(format!(
            "{}\n\n{}",
            reply.reply,
            format!("session: {}", reply.session_id).dimmed()
        )),
    }
}

pub fn format_history(
    history: &ConversationHistory,
    format: OutputFormat,
) -> Result<String, RelayError> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(history)?);
    }

    let title = format!(
        "Session {} ({} messages)",
        history.session_id,
        history.messages.len()
    );
    if history.messages.is_empty() {
        return Ok(format!("{}\n\nNo messages yet.", title.bold()));
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(MESSAGE_COLUMN_WIDTH);
    table.set_header(vec!["#", "Role", "Message", "Sent"]);
    for (i, message) in history.messages.iter().enumerate() {
        let role = if message.role == SENDER_USER {
            "customer"
        } else {
            "agent"
        };
        table.add_row(vec![
            (i + 1).to_string(),
            role.to_string(),
            message.text.clone(),
            message.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    Ok(format!("{}\n{}", title.bold(), table))
}
