//! Retention pruning: keep the newest `limit` countable messages, delete the
//! rest.

use std::time::Duration;

use {
    autodelete_channels::{HistoryMessage, MessageHistory},
    autodelete_config::RetentionPolicy,
    tracing::{debug, info, warn},
};

/// Extra messages fetched beyond `limit` to absorb exempt messages.
pub const DEFAULT_FETCH_SLACK: usize = 100;

/// Pause after every deletion to stay under platform rate limits.
pub const DEFAULT_DELETE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct PrunerConfig {
    pub fetch_slack: usize,
    pub delete_delay: Duration,
}

impl Default for PrunerConfig {
    fn default() -> Self {
        Self {
            fetch_slack: DEFAULT_FETCH_SLACK,
            delete_delay: DEFAULT_DELETE_DELAY,
        }
    }
}

/// Why a pruning batch stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneAbort {
    /// The bot may not read or delete messages in the channel.
    Forbidden,
    /// A request failed for any other reason.
    Request,
}

/// What a single pruning pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub fetched: usize,
    pub countable: usize,
    pub overflow: usize,
    pub deleted: usize,
    pub aborted: Option<PruneAbort>,
}

/// Whether `message` counts toward the retained window under `policy`.
pub fn is_countable(message: &HistoryMessage, policy: &RetentionPolicy) -> bool {
    if policy.keep_pinned && message.pinned {
        return false;
    }
    if policy.keep_bot_embeds && message.author_is_bot && message.has_embeds() {
        return false;
    }
    true
}

/// Countable messages beyond `limit`, given newest-first history.
///
/// Empty while fewer than `limit` messages are countable.
pub fn overflow<'a>(history: &'a [HistoryMessage], policy: &RetentionPolicy) -> Vec<&'a HistoryMessage> {
    history
        .iter()
        .filter(|message| is_countable(message, policy))
        .skip(policy.limit as usize)
        .collect()
}

/// Applies a [`RetentionPolicy`] to a channel.
#[derive(Debug, Clone, Default)]
pub struct RetentionPruner {
    config: PrunerConfig,
}

impl RetentionPruner {
    pub fn new(config: PrunerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PrunerConfig {
        &self.config
    }

    /// Delete the channel's overflow, one message at a time.
    ///
    /// The first failed request ends the batch; the report still carries the
    /// deletions made before it.
    pub async fn prune(
        &self,
        history: &dyn MessageHistory,
        channel_id: &str,
        policy: &RetentionPolicy,
    ) -> PruneReport {
        let window = (policy.limit as usize).saturating_add(self.config.fetch_slack);
        let messages = match history.recent_messages(channel_id, window).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(channel_id, error = %e, "failed to fetch channel history");
                return PruneReport {
                    aborted: Some(abort_kind(&e)),
                    ..PruneReport::default()
                };
            },
        };

        let countable = messages
            .iter()
            .filter(|message| is_countable(message, policy))
            .count();
        let to_delete = overflow(&messages, policy);
        debug!(
            channel_id,
            fetched = messages.len(),
            countable,
            limit = policy.limit,
            "evaluated retention window"
        );

        let mut report = PruneReport {
            fetched: messages.len(),
            countable,
            overflow: to_delete.len(),
            ..PruneReport::default()
        };

        for message in to_delete {
            if let Err(e) = history.delete_message(channel_id, &message.id).await {
                let kind = abort_kind(&e);
                match kind {
                    PruneAbort::Forbidden => {
                        warn!(channel_id, "missing permissions to manage messages")
                    },
                    PruneAbort::Request => {
                        warn!(channel_id, message_id = %message.id, error = %e, "delete failed")
                    },
                }
                report.aborted = Some(kind);
                break;
            }
            report.deleted += 1;
            if !self.config.delete_delay.is_zero() {
                tokio::time::sleep(self.config.delete_delay).await;
            }
        }

        if report.deleted > 0 {
            info!(channel_id, deleted = report.deleted, "pruned channel");
        }
        report
    }
}

fn abort_kind(error: &autodelete_channels::Error) -> PruneAbort {
    if error.is_forbidden() {
        PruneAbort::Forbidden
    } else {
        PruneAbort::Request
    }
}
