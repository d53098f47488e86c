//! Routes inbound platform events to the pruner and command handlers.

use std::sync::Arc;

use {
    autodelete_channels::{Embed, GuildDirectory, MessageHistory},
    tokio::sync::{RwLock, Semaphore},
    tracing::{debug, error, info, warn},
};

use crate::{
    commands::{self, Command, CommandContext, Invocation, Reply},
    list_view::ListViews,
    pruner::{PruneReport, PrunerConfig, RetentionPruner},
    purge::PurgeConfirmations,
    store::{ConfigStore, SharedStore},
};

/// Pruning passes allowed to run at the same time.
pub const MAX_CONCURRENT_PRUNES: usize = 3;

#[derive(Debug, Clone)]
pub struct ModeratorConfig {
    pub pruner: PrunerConfig,
    pub max_concurrent_prunes: usize,
}

impl Default for ModeratorConfig {
    fn default() -> Self {
        Self {
            pruner: PrunerConfig::default(),
            max_concurrent_prunes: MAX_CONCURRENT_PRUNES,
        }
    }
}

/// Platform events the moderator reacts to, with ids as strings.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    MessageCreated {
        guild_id: Option<String>,
        channel_id: String,
        author_is_bot: bool,
    },
    ReactionAdded {
        message_id: String,
        user_id: String,
        emoji: String,
    },
    InteractionInvoked {
        invocation: Invocation,
        command: Command,
    },
    /// Answer to a purge confirmation prompt.
    PurgeConfirmed {
        invocation: Invocation,
        token: String,
        text: String,
    },
}

#[derive(Debug)]
pub enum Outcome {
    Ignored,
    Pruned(PruneReport),
    /// A list page turn was accepted; `embed` is set when the page changed.
    PageTurned { embed: Option<Embed> },
    Reply(Reply),
}

/// Owns the process-wide moderation state.
pub struct Moderator {
    store: SharedStore,
    pruner: RetentionPruner,
    guard: Semaphore,
    views: Arc<ListViews>,
    purges: PurgeConfirmations,
}

impl Moderator {
    pub fn new(store: ConfigStore, config: ModeratorConfig) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            pruner: RetentionPruner::new(config.pruner),
            guard: Semaphore::new(config.max_concurrent_prunes.max(1)),
            views: Arc::new(ListViews::new()),
            purges: PurgeConfirmations::default(),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn views(&self) -> &Arc<ListViews> {
        &self.views
    }

    pub async fn dispatch<P>(&self, platform: &P, event: InboundEvent) -> Outcome
    where
        P: MessageHistory + GuildDirectory,
    {
        match event {
            InboundEvent::MessageCreated {
                guild_id,
                channel_id,
                author_is_bot,
            } => {
                if author_is_bot || guild_id.is_none() {
                    return Outcome::Ignored;
                }
                self.on_message(platform, &channel_id).await
            },
            InboundEvent::ReactionAdded {
                message_id,
                user_id,
                emoji,
            } => match self.views.turn(&message_id, &user_id, &emoji) {
                Some(embed) => Outcome::PageTurned { embed },
                None => Outcome::Ignored,
            },
            InboundEvent::InteractionInvoked {
                invocation,
                command,
            } => {
                let ctx = self.command_context(platform);
                Outcome::Reply(commands::execute(&ctx, &invocation, command).await)
            },
            InboundEvent::PurgeConfirmed {
                invocation,
                token,
                text,
            } => {
                let ctx = self.command_context(platform);
                Outcome::Reply(commands::confirm_purge(&ctx, &invocation, &token, &text).await)
            },
        }
    }

    /// Stop admitting pruning passes and release live list views.
    pub fn shutdown(&self) {
        self.guard.close();
        self.views.cancel_all();
        info!("moderator shut down");
    }

    /// Whether [`Moderator::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        self.guard.is_closed()
    }

    async fn on_message(&self, history: &dyn MessageHistory, channel_id: &str) -> Outcome {
        let Ok(_permit) = self.guard.acquire().await else {
            debug!(channel_id, "pruning closed, message ignored");
            return Outcome::Ignored;
        };

        let policy = {
            let store = self.store.read().await;
            match store.policy(channel_id) {
                Some(policy) if policy.enabled => policy.clone(),
                _ => return Outcome::Ignored,
            }
        };

        let report = self.pruner.prune(history, channel_id, &policy).await;
        if report.deleted > 0 {
            let result = self
                .store
                .write()
                .await
                .record_deletions(channel_id, report.deleted as u64)
                .await;
            if let Err(e) = result {
                error!(channel_id, error = %e, "failed to save deletion count");
            }
        }
        if report.aborted.is_some() {
            warn!(channel_id, deleted = report.deleted, "pruning aborted");
        }
        Outcome::Pruned(report)
    }

    fn command_context<'a>(&'a self, directory: &'a dyn GuildDirectory) -> CommandContext<'a> {
        CommandContext {
            store: &self.store,
            directory,
            purges: &self.purges,
        }
    }
}
