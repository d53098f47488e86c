//! Narrow interfaces to the chat platform.
//!
//! The moderation core only needs to read recent history, delete single
//! messages, resolve which guild owns a channel, and check that a role
//! exists. Platform adapters (serenity for Discord) implement these traits;
//! tests substitute in-memory fakes.

pub mod embed;
pub mod error;
pub mod gating;
pub mod platform;

pub use {
    embed::{Embed, EmbedColor, EmbedField},
    error::{Error, Result},
    platform::{GuildDirectory, HistoryMessage, MessageHistory},
};
