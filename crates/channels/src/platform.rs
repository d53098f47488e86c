use async_trait::async_trait;

use crate::Result;

/// The parts of a channel message that retention rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub id: String,
    pub pinned: bool,
    pub author_is_bot: bool,
    pub embed_count: usize,
}

impl HistoryMessage {
    /// A plain, unpinned message from a human author.
    pub fn plain(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pinned: false,
            author_is_bot: false,
            embed_count: 0,
        }
    }

    pub fn has_embeds(&self) -> bool {
        self.embed_count > 0
    }
}

/// Read and prune channel history.
#[async_trait]
pub trait MessageHistory: Send + Sync {
    /// Up to `limit` most recent messages of the channel, newest first.
    async fn recent_messages(&self, channel_id: &str, limit: usize) -> Result<Vec<HistoryMessage>>;

    /// Delete a single message.
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()>;
}

/// Synchronous lookups against the platform's cached guild state.
pub trait GuildDirectory: Send + Sync {
    /// Guild owning `channel_id`, if the channel is known.
    fn guild_of_channel(&self, channel_id: &str) -> Option<String>;

    /// Whether `role_id` exists in `guild_id`.
    fn role_exists(&self, guild_id: &str, role_id: &str) -> bool;
}
