//! In-memory platform double shared by the crate's tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use {
    async_trait::async_trait,
    autodelete_channels::{Error, GuildDirectory, HistoryMessage, MessageHistory, Result},
};

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Forbidden,
    Request,
}

impl Failure {
    fn into_error(self, context: &str) -> Error {
        match self {
            Self::Forbidden => Error::forbidden(context.to_string()),
            Self::Request => Error::request(
                context.to_string(),
                std::io::Error::other("connection reset"),
            ),
        }
    }
}

/// Channel histories (newest first), guild ownership and roles.
#[derive(Default)]
pub struct FakePlatform {
    history: Mutex<HashMap<String, Vec<HistoryMessage>>>,
    deleted: Mutex<HashMap<String, Vec<String>>>,
    fetch_windows: Mutex<Vec<usize>>,
    delete_attempts: Mutex<usize>,
    fail_delete: Mutex<HashMap<String, Failure>>,
    fail_fetch: Mutex<Option<Failure>>,
    channel_guilds: Mutex<HashMap<String, String>>,
    roles: Mutex<HashSet<(String, String)>>,
}

impl FakePlatform {
    pub fn with_history(channel_id: &str, messages: Vec<HistoryMessage>) -> Self {
        let platform = Self::default();
        platform.set_history(channel_id, messages);
        platform
    }

    pub fn set_history(&self, channel_id: &str, messages: Vec<HistoryMessage>) {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(channel_id.to_string(), messages);
    }

    pub fn add_channel(&self, channel_id: &str, guild_id: &str) {
        self.channel_guilds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(channel_id.to_string(), guild_id.to_string());
    }

    pub fn add_role(&self, guild_id: &str, role_id: &str) {
        self.roles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((guild_id.to_string(), role_id.to_string()));
    }

    pub fn fail_delete(&self, message_id: &str, failure: Failure) {
        self.fail_delete
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(message_id.to_string(), failure);
    }

    pub fn fail_fetch(&self, failure: Failure) {
        *self.fail_fetch.lock().unwrap_or_else(|e| e.into_inner()) = Some(failure);
    }

    pub fn deleted(&self, channel_id: &str) -> Vec<String> {
        self.deleted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn remaining(&self, channel_id: &str) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(channel_id)
            .map(|messages| messages.iter().map(|m| m.id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn fetch_windows(&self) -> Vec<usize> {
        self.fetch_windows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn delete_attempts(&self) -> usize {
        *self.delete_attempts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MessageHistory for FakePlatform {
    async fn recent_messages(&self, channel_id: &str, limit: usize) -> Result<Vec<HistoryMessage>> {
        self.fetch_windows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(limit);
        if let Some(failure) = *self.fail_fetch.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(failure.into_error("fetch history"));
        }
        Ok(self
            .history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(channel_id)
            .map(|messages| messages.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        *self.delete_attempts.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        if let Some(failure) = self
            .fail_delete
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(message_id)
            .copied()
        {
            return Err(failure.into_error("delete message"));
        }
        if let Some(messages) = self
            .history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(channel_id)
        {
            messages.retain(|m| m.id != message_id);
        }
        self.deleted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(channel_id.to_string())
            .or_default()
            .push(message_id.to_string());
        Ok(())
    }
}

impl GuildDirectory for FakePlatform {
    fn guild_of_channel(&self, channel_id: &str) -> Option<String> {
        self.channel_guilds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(channel_id)
            .cloned()
    }

    fn role_exists(&self, guild_id: &str, role_id: &str) -> bool {
        self.roles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&(guild_id.to_string(), role_id.to_string()))
    }
}
