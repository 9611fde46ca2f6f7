//! CLI presentation: text and json formatters per command family.

mod chat;
mod health;

pub use chat::{format_chat_reply, format_history};
pub use health::format_health;
