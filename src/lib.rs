//! Support Relay: customer-support chat with retrying AI replies
//!
//! Stores conversations, builds a bounded context window from recent messages
//! and asks a generative model for the next reply. Every provider call races a
//! deadline, and failures are classified into a closed set of kinds that
//! decide between retry with backoff, a fixed deflection or a caller-facing
//! error.

pub mod chat;
pub mod cli;
pub mod config;
pub mod context;
pub mod conversation;
pub mod error;
pub mod generation;
pub mod logging;
pub mod provider;
