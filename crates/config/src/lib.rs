//! Configuration schema, persistence backends, and process settings.
//!
//! The whole configuration lives in one JSON document (default
//! `autodelete_config.json`): one entry per moderated channel plus the
//! reserved `management_roles` and `deleted_message_count` keys.

pub mod error;
pub mod schema;
pub mod settings;
pub mod store;
pub mod store_file;
pub mod store_memory;

pub use {
    error::{Error, Result},
    schema::{RetentionPolicy, StoreDocument},
    settings::BotSettings,
    store::StorePersistence,
    store_file::JsonFileStore,
    store_memory::InMemoryStore,
};
