//! Discord adapter: serenity client, event handler and the platform
//! implementation used by the moderation core.

pub mod bot;
pub mod commands;
pub mod error;
pub mod handler;
pub mod platform;
pub mod render;
pub mod restart;

pub use {
    bot::run,
    error::{Error, Result},
    handler::AutoDeleteHandler,
    platform::SerenityPlatform,
};
