//! `/autodelete` command handlers.
//!
//! Handlers map a parsed [`Command`] to a [`Reply`]. They never talk to the
//! platform directly: anything interactive (the paginated list, the purge
//! confirmation, the restart) is returned for the adapter to carry out.

use {
    autodelete_channels::{
        Embed, EmbedColor, GuildDirectory,
        embed::{channel_mention, role_mention},
        gating::{Gate, check_management, parse_role_mentions},
    },
    autodelete_config::RetentionPolicy,
    tracing::{debug, error, info},
};

use crate::{
    list_view::{ListEntry, ListView, policy_summary},
    purge::{PurgeConfirmations, is_confirmed},
    store::{PolicyUpdate, SharedStore},
};

/// Name of the slash-command group.
pub const NAMESPACE: &str = "autodelete";

/// A subcommand and its help text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// Every subcommand, in help order.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "restart",
        description: "Restarts the bot.",
    },
    CommandSpec {
        name: "setup",
        description: "Set the management roles required to use the bot.",
    },
    CommandSpec {
        name: "add",
        description: "Add a new task.",
    },
    CommandSpec {
        name: "remove",
        description: "Remove a task.",
    },
    CommandSpec {
        name: "list",
        description: "View all existing tasks.",
    },
    CommandSpec {
        name: "edit",
        description: "Edit an existing task.",
    },
    CommandSpec {
        name: "stats",
        description: "View this server's bot statistics.",
    },
    CommandSpec {
        name: "disable",
        description: "Bulk disable all tasks for this server.",
    },
    CommandSpec {
        name: "enable",
        description: "Bulk enable all tasks for this server.",
    },
    CommandSpec {
        name: "help",
        description: "Displays a list of all available commands.",
    },
    CommandSpec {
        name: "purge",
        description: "Purge all tasks for this server.",
    },
];

/// Who invoked a command, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub user_id: String,
    pub member_roles: Vec<String>,
}

/// Parsed `/autodelete` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Role mentions, space separated, as typed by the user.
    Setup { roles: String },
    /// Commands reserved to management roles.
    Managed(ManagedCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagedCommand {
    Restart,
    Add {
        channel_id: String,
        limit: u32,
        keep_pinned: bool,
        keep_bot_embeds: bool,
        enabled: bool,
    },
    Remove {
        channel_id: String,
    },
    List,
    Edit {
        channel_id: String,
        update: PolicyUpdate,
    },
    Stats,
    Enable,
    Disable,
    Purge,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Setup { .. } => "setup",
            Self::Managed(command) => match command {
                ManagedCommand::Restart => "restart",
                ManagedCommand::Add { .. } => "add",
                ManagedCommand::Remove { .. } => "remove",
                ManagedCommand::List => "list",
                ManagedCommand::Edit { .. } => "edit",
                ManagedCommand::Stats => "stats",
                ManagedCommand::Enable => "enable",
                ManagedCommand::Disable => "disable",
                ManagedCommand::Purge => "purge",
            },
        }
    }
}

/// What the adapter should do in response to a command.
#[derive(Debug)]
pub enum Reply {
    /// Public response.
    Embed(Embed),
    /// Response visible only to the invoker.
    Private(Embed),
    /// Send the first page, then hand the view to the page-turn registry.
    List(ListView),
    /// Ask the invoker to confirm; the answer comes back with `token`.
    ConfirmPurge { token: String },
    /// Post `notice`, then restart the process.
    Restart { notice: Embed },
}

impl Reply {
    /// The embed shown first, when the reply carries one.
    pub fn embed(&self) -> Option<Embed> {
        match self {
            Self::Embed(embed) | Self::Private(embed) | Self::Restart { notice: embed } => {
                Some(embed.clone())
            },
            Self::List(view) => Some(view.render()),
            Self::ConfirmPurge { .. } => None,
        }
    }
}

/// Shared state a handler may touch.
pub struct CommandContext<'a> {
    pub store: &'a SharedStore,
    pub directory: &'a dyn GuildDirectory,
    pub purges: &'a PurgeConfirmations,
}

/// Run a command on behalf of `invocation`.
pub async fn execute(ctx: &CommandContext<'_>, invocation: &Invocation, command: Command) -> Reply {
    debug!(
        command = command.name(),
        user_id = %invocation.user_id,
        guild_id = ?invocation.guild_id,
        "command invoked"
    );
    match command {
        Command::Help => Reply::Embed(help_embed()),
        Command::Setup { roles } => setup(ctx, invocation, &roles).await,
        Command::Managed(command) => {
            let guild_id = match authorize(ctx.store, invocation).await {
                Ok(guild_id) => guild_id,
                Err(gate) => {
                    info!(
                        user_id = %invocation.user_id,
                        guild_id = ?invocation.guild_id,
                        ?gate,
                        "command rejected"
                    );
                    return Reply::Embed(rejection_embed(gate));
                },
            };
            managed(ctx, invocation, &guild_id, command).await
        },
    }
}

/// Second step of `purge`: apply or cancel a pending purge.
pub async fn confirm_purge(
    ctx: &CommandContext<'_>,
    invocation: &Invocation,
    token: &str,
    text: &str,
) -> Reply {
    let Some(pending) = ctx.purges.take(token, &invocation.user_id) else {
        return Reply::Private(Embed::new(
            "Purge expired",
            "This confirmation is no longer valid. Run `/autodelete purge` again.",
            EmbedColor::Orange,
        ));
    };
    if !is_confirmed(text) {
        info!(guild_id = %pending.guild_id, "purge cancelled");
        return Reply::Private(Embed::new(
            "Purge cancelled",
            "You did not confirm the action. Task purge has been cancelled.",
            EmbedColor::Green,
        ));
    }

    // Roles may have changed while the confirmation was pending.
    match authorize(ctx.store, invocation).await {
        Ok(guild_id) if guild_id == pending.guild_id => {},
        Ok(_) => return Reply::Embed(rejection_embed(Gate::NotInGuild)),
        Err(gate) => {
            info!(
                user_id = %invocation.user_id,
                guild_id = %pending.guild_id,
                ?gate,
                "purge rejected"
            );
            return Reply::Embed(rejection_embed(gate));
        },
    }

    let result = ctx
        .store
        .write()
        .await
        .remove_policies(&pending.channel_ids)
        .await;
    match result {
        Ok(removed) => {
            info!(guild_id = %pending.guild_id, removed, "purged tasks");
            Reply::Embed(Embed::new(
                "Purge finished",
                "All tasks for this server have been successfully purged.",
                EmbedColor::Red,
            ))
        },
        Err(e) => save_failed(&e),
    }
}

/// Replaces the restart notice when no replacement process could be started.
pub fn restart_failed_embed() -> Embed {
    Embed::new(
        "Restart Failed",
        "The bot could not restart and is still running.",
        EmbedColor::Red,
    )
}

/// Shown by the replacement process once it is back online.
pub fn restart_complete_embed() -> Embed {
    Embed::new(
        "Restart Successful",
        "The bot has restarted and is now online.",
        EmbedColor::Green,
    )
}

async fn authorize(store: &SharedStore, invocation: &Invocation) -> Result<String, Gate> {
    let guild_id = invocation.guild_id.as_deref();
    let required = match guild_id {
        Some(guild_id) => store.read().await.management_roles(guild_id).to_vec(),
        None => Vec::new(),
    };
    match (check_management(guild_id, &required, &invocation.member_roles), guild_id) {
        (Gate::Granted, Some(guild_id)) => Ok(guild_id.to_string()),
        (Gate::Granted, None) => Err(Gate::NotInGuild),
        (gate, _) => Err(gate),
    }
}

async fn managed(
    ctx: &CommandContext<'_>,
    invocation: &Invocation,
    guild_id: &str,
    command: ManagedCommand,
) -> Reply {
    match command {
        ManagedCommand::Restart => Reply::Restart {
            notice: Embed::new(
                "Restarting",
                "The bot is restarting... Please wait a moment.",
                EmbedColor::Orange,
            ),
        },
        ManagedCommand::Add {
            channel_id,
            limit,
            keep_pinned,
            keep_bot_embeds,
            enabled,
        } => {
            let policy = RetentionPolicy {
                limit,
                keep_pinned,
                keep_bot_embeds,
                enabled,
                guild_id: guild_id.to_string(),
            };
            let summary = policy_summary(&policy);
            let result = ctx
                .store
                .write()
                .await
                .upsert_policy(&channel_id, policy)
                .await;
            match result {
                Ok(()) => {
                    info!(guild_id, channel_id, limit, "task added");
                    Reply::Embed(Embed::new(
                        "Task added",
                        format!(
                            "A task has been added for {}.\n\n{summary}",
                            channel_mention(&channel_id)
                        ),
                        EmbedColor::Green,
                    ))
                },
                Err(e) => save_failed(&e),
            }
        },
        ManagedCommand::Remove { channel_id } => {
            let result = ctx.store.write().await.remove_policy(&channel_id).await;
            match result {
                Ok(Some(_)) => {
                    info!(guild_id, channel_id, "task removed");
                    Reply::Embed(Embed::new(
                        "Task removed",
                        format!("A task has been removed for {}.", channel_mention(&channel_id)),
                        EmbedColor::Red,
                    ))
                },
                Ok(None) => Reply::Embed(Embed::new(
                    "No task",
                    format!("No task was found for {}.", channel_mention(&channel_id)),
                    EmbedColor::Orange,
                )),
                Err(e) => save_failed(&e),
            }
        },
        ManagedCommand::List => {
            let entries: Vec<ListEntry> = ctx
                .store
                .read()
                .await
                .guild_policies(guild_id)
                .into_iter()
                .map(|(channel_id, policy)| ListEntry {
                    channel_id: channel_id.to_string(),
                    policy: policy.clone(),
                })
                .collect();
            if entries.is_empty() {
                return Reply::Embed(Embed::new(
                    "No tasks",
                    "There are no available tasks.\nUse `/autodelete` to `add`, `remove`, or \
                     `edit` a task.\nUse `/autodelete help` for a list of commands.",
                    EmbedColor::Orange,
                ));
            }
            Reply::List(ListView::new(invocation.user_id.clone(), entries))
        },
        ManagedCommand::Edit { channel_id, update } => {
            let result = ctx
                .store
                .write()
                .await
                .update_policy(&channel_id, &update)
                .await;
            match result {
                Ok(Some(policy)) => {
                    info!(guild_id, channel_id, "task updated");
                    Reply::Embed(Embed::new(
                        "Task updated",
                        format!(
                            "The task for {} has been updated.\n\n{}",
                            channel_mention(&channel_id),
                            policy_summary(&policy)
                        ),
                        EmbedColor::Green,
                    ))
                },
                Ok(None) => Reply::Embed(Embed::new(
                    "Task not found",
                    format!("Couldn't find a task for {}.", channel_mention(&channel_id)),
                    EmbedColor::Orange,
                )),
                Err(e) => save_failed(&e),
            }
        },
        ManagedCommand::Stats => Reply::Embed(stats(ctx, guild_id).await),
        ManagedCommand::Enable => toggle_all(ctx, guild_id, true).await,
        ManagedCommand::Disable => toggle_all(ctx, guild_id, false).await,
        ManagedCommand::Purge => {
            let channel_ids: Vec<String> = ctx
                .store
                .read()
                .await
                .guild_policies(guild_id)
                .into_iter()
                .map(|(channel_id, _)| channel_id.to_string())
                .collect();
            if channel_ids.is_empty() {
                return Reply::Embed(Embed::new(
                    "No tasks",
                    "There are no tasks added for this server.",
                    EmbedColor::Orange,
                ));
            }
            let token = ctx
                .purges
                .request(guild_id, &invocation.user_id, channel_ids);
            Reply::ConfirmPurge { token }
        },
    }
}

async fn setup(ctx: &CommandContext<'_>, invocation: &Invocation, roles: &str) -> Reply {
    let Some(guild_id) = invocation.guild_id.as_deref() else {
        return Reply::Embed(Embed::new(
            "Error",
            "This command must be used in a server.",
            EmbedColor::Red,
        ));
    };

    // First-time setup is open; changing an existing list is not.
    let configured = ctx.store.read().await.management_roles(guild_id).to_vec();
    if !configured.is_empty() {
        let gate = check_management(Some(guild_id), &configured, &invocation.member_roles);
        if gate != Gate::Granted {
            return Reply::Embed(rejection_embed(gate));
        }
    }

    let role_ids: Vec<String> = parse_role_mentions(roles)
        .into_iter()
        .filter(|role_id| ctx.directory.role_exists(guild_id, role_id))
        .collect();
    if role_ids.is_empty() {
        return Reply::Embed(Embed::new(
            "Error",
            "No valid roles were provided.",
            EmbedColor::Red,
        ));
    }

    let mentions = role_ids
        .iter()
        .map(|id| role_mention(id))
        .collect::<Vec<_>>()
        .join(", ");
    let result = ctx
        .store
        .write()
        .await
        .set_management_roles(guild_id, role_ids)
        .await;
    match result {
        Ok(()) => {
            info!(guild_id, roles = %mentions, "management roles set");
            Reply::Embed(Embed::new(
                "Roles Set",
                format!("The following roles have been set: {mentions}"),
                EmbedColor::Green,
            ))
        },
        Err(e) => save_failed(&e),
    }
}

async fn stats(ctx: &CommandContext<'_>, guild_id: &str) -> Embed {
    let store = ctx.store.read().await;
    let policies = store.guild_policies(guild_id);
    let total = policies.len();
    let active = policies.iter().filter(|(_, p)| p.enabled).count();
    let roles = store.management_roles(guild_id);
    let role_list = if roles.is_empty() {
        "None".to_string()
    } else {
        roles
            .iter()
            .map(|id| role_mention(id))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut per_channel = Vec::new();
    let mut combined: u64 = 0;
    for (channel_id, count) in store.deletion_counts() {
        let owner = ctx
            .directory
            .guild_of_channel(channel_id)
            .or_else(|| store.policy(channel_id).map(|p| p.guild_id.clone()));
        if owner.as_deref() == Some(guild_id) {
            per_channel.push(format!("{}: `{count}`", channel_mention(channel_id)));
            combined = combined.saturating_add(*count);
        }
    }

    Embed::new(
        "Statistics",
        format!(
            "Total Tasks: `{total}`\nActive Tasks: `{active}`\nInactive Tasks: `{}`\n\
             Management Roles: {role_list}\n\nDeleted Messages per Channel:\n{}\n\n\
             Combined Total Deleted Messages: `{combined}`",
            total - active,
            per_channel.join("\n"),
        ),
        EmbedColor::Blue,
    )
}

async fn toggle_all(ctx: &CommandContext<'_>, guild_id: &str, enabled: bool) -> Reply {
    let result = ctx
        .store
        .write()
        .await
        .set_guild_enabled(guild_id, enabled)
        .await;
    match result {
        Ok(affected) => {
            let state = if enabled {
                "enabled"
            } else {
                "disabled"
            };
            info!(guild_id, affected, state, "bulk toggled tasks");
            Reply::Embed(Embed::new(
                format!("Tasks {state}"),
                format!("All tasks have been `{state}` for this server."),
                EmbedColor::Green,
            ))
        },
        Err(e) => save_failed(&e),
    }
}

fn help_embed() -> Embed {
    COMMANDS.iter().fold(
        Embed::new(
            "Commands",
            "Here is a list of all available commands:",
            EmbedColor::Green,
        ),
        |embed, spec| {
            embed.field(
                format!("/{NAMESPACE} {}", spec.name),
                format!("`{}`", spec.description),
                true,
            )
        },
    )
}

fn rejection_embed(gate: Gate) -> Embed {
    match gate {
        Gate::NotInGuild => Embed::new(
            "Invalid",
            "This command cannot be used here.",
            EmbedColor::Red,
        ),
        Gate::NeedsSetup => Embed::new(
            "Setup",
            "No management roles have been set for this server.\nUse `/autodelete setup` to set \
             roles required to use the bot.",
            EmbedColor::Orange,
        ),
        Gate::Denied | Gate::Granted => Embed::new(
            "Setup",
            "You don't have any of the required management roles to use this command.",
            EmbedColor::Red,
        ),
    }
}

fn save_failed(error: &crate::Error) -> Reply {
    error!(error = %error, "failed to save config");
    Reply::Embed(Embed::new(
        "Error",
        "The configuration could not be saved. Please try again.",
        EmbedColor::Red,
    ))
}
