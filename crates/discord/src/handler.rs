//! Discord event handler for serenity.
//!
//! Translates gateway events into [`InboundEvent`]s for the [`Moderator`]
//! and carries out the returned [`Reply`].

use std::sync::{Arc, Mutex};

use {
    autodelete_channels::{Embed, EmbedColor},
    autodelete_moderation::{
        InboundEvent, Invocation, ListView, Moderator, Outcome, Reply,
        commands::{NAMESPACE, restart_complete_embed, restart_failed_embed},
        list_view::{IDLE_TIMEOUT, NEXT_EMOJI, PREVIOUS_EMOJI, ViewState},
        restart::RestartMarkers,
    },
    serenity::{
        all::{
            ActionRowComponent, ChannelId, Command as SlashCommand, CommandInteraction, Context,
            CreateActionRow, CreateInputText, CreateInteractionResponse,
            CreateInteractionResponseMessage, CreateModal, EditInteractionResponse, EditMessage,
            EventHandler, GatewayIntents, GuildId, InputTextStyle, Interaction, Member, Message, MessageId,
            ModalInteraction, Reaction, ReactionType, Ready, UserId,
        },
        async_trait,
    },
    tracing::{debug, info, warn},
};

use crate::{
    commands::{parse, slash_command},
    platform::{SerenityPlatform, parse_id},
    render::create_embed,
    restart::Restarter,
};

/// Custom id prefix of the purge confirmation modal.
const PURGE_MODAL_PREFIX: &str = "purge:";

/// Handler for Discord gateway events.
pub struct AutoDeleteHandler {
    moderator: Arc<Moderator>,
    restarter: Arc<Restarter>,
    /// Set when this process replaced a restarting one.
    restarted: Mutex<Option<RestartMarkers>>,
}

impl AutoDeleteHandler {
    pub fn new(
        moderator: Arc<Moderator>,
        restarter: Arc<Restarter>,
        restarted: Option<RestartMarkers>,
    ) -> Self {
        Self {
            moderator,
            restarter,
            restarted: Mutex::new(restarted),
        }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
            | GatewayIntents::MESSAGE_CONTENT
    }

    async fn confirm_restart(&self, ctx: &Context) {
        let markers = self
            .restarted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let Some(markers) = markers else {
            return;
        };
        let (Ok(channel), Ok(message)) = (
            parse_id::<ChannelId>(&markers.channel_id),
            parse_id::<MessageId>(&markers.message_id),
        ) else {
            warn!(?markers, "invalid restart markers");
            return;
        };
        let edit = EditMessage::new().embed(create_embed(&restart_complete_embed()));
        match channel.edit_message(&ctx.http, message, edit).await {
            Ok(_) => info!(channel_id = %channel, "restart confirmed"),
            Err(e) => warn!(error = %e, "failed to edit restart notice"),
        }
    }

    async fn on_command(&self, ctx: &Context, command: &CommandInteraction) {
        if command.data.name != NAMESPACE {
            return;
        }
        let invocation = invocation(
            command.guild_id,
            command.channel_id,
            command.user.id,
            command.member.as_deref(),
        );
        let parsed = match parse(&command.data) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(error = %e, "rejected command options");
                let embed = Embed::new("Invalid", e.to_string(), EmbedColor::Red);
                respond(ctx, command, message_response(&embed, true)).await;
                return;
            },
        };

        let platform = SerenityPlatform::new(ctx);
        let event = InboundEvent::InteractionInvoked {
            invocation,
            command: parsed,
        };
        if let Outcome::Reply(reply) = self.moderator.dispatch(&platform, event).await {
            self.deliver(ctx, command, reply).await;
        }
    }

    async fn on_modal(&self, ctx: &Context, modal: &ModalInteraction) {
        let Some(token) = modal.data.custom_id.strip_prefix(PURGE_MODAL_PREFIX) else {
            return;
        };
        let text = modal
            .data
            .components
            .iter()
            .flat_map(|row| row.components.iter())
            .find_map(|component| match component {
                ActionRowComponent::InputText(input) => input.value.clone(),
                _ => None,
            })
            .unwrap_or_default();

        let platform = SerenityPlatform::new(ctx);
        let event = InboundEvent::PurgeConfirmed {
            invocation: invocation(
                modal.guild_id,
                modal.channel_id,
                modal.user.id,
                modal.member.as_ref(),
            ),
            token: token.to_string(),
            text,
        };
        let Outcome::Reply(reply) = self.moderator.dispatch(&platform, event).await else {
            return;
        };
        let response = match &reply {
            Reply::Embed(embed) => message_response(embed, false),
            Reply::Private(embed) => message_response(embed, true),
            other => {
                warn!(reply = ?other, "unexpected reply to purge confirmation");
                return;
            },
        };
        if let Err(e) = modal.create_response(&ctx.http, response).await {
            warn!(error = %e, "failed to answer purge confirmation");
        }
    }

    async fn deliver(&self, ctx: &Context, command: &CommandInteraction, reply: Reply) {
        match reply {
            Reply::Embed(embed) => respond(ctx, command, message_response(&embed, false)).await,
            Reply::Private(embed) => respond(ctx, command, message_response(&embed, true)).await,
            Reply::List(view) => self.show_list(ctx, command, view).await,
            Reply::ConfirmPurge { token } => {
                respond(ctx, command, purge_modal(&token)).await;
            },
            Reply::Restart { notice } => {
                respond(ctx, command, message_response(&notice, false)).await;
                let message = match command.get_response(&ctx.http).await {
                    Ok(message) => message,
                    Err(e) => {
                        warn!(error = %e, "failed to read restart notice, not restarting");
                        return;
                    },
                };
                let markers = RestartMarkers::new(message.channel_id.to_string(), message.id.to_string());
                info!(user_id = %command.user.id, "restart requested");
                if let Err(e) = self.restarter.restart(&markers, &self.moderator).await {
                    warn!(error = %e, "restart failed, still running");
                    let edit = EditInteractionResponse::new().embed(create_embed(&restart_failed_embed()));
                    if let Err(e) = command.edit_response(&ctx.http, edit).await {
                        warn!(error = %e, "failed to edit restart notice");
                    }
                }
            },
        }
    }

    async fn show_list(&self, ctx: &Context, command: &CommandInteraction, view: ListView) {
        respond(ctx, command, message_response(&view.render(), false)).await;
        if !view.has_controls() {
            return;
        }
        let message = match command.get_response(&ctx.http).await {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "failed to read list message");
                return;
            },
        };
        for emoji in [PREVIOUS_EMOJI, NEXT_EMOJI] {
            if let Err(e) = message
                .react(&ctx.http, ReactionType::Unicode(emoji.to_string()))
                .await
            {
                warn!(error = %e, "failed to add page control");
                return;
            }
        }

        let message_id = message.id.to_string();
        let views = Arc::clone(self.moderator.views());
        if !views.register(message_id.clone(), view) {
            return;
        }
        let http = Arc::clone(&ctx.http);
        let channel = message.channel_id;
        let id = message.id;
        tokio::spawn(async move {
            if views.watch_idle(&message_id, IDLE_TIMEOUT).await == ViewState::TimedOut
                && let Err(e) = channel.delete_reactions(&http, id).await
            {
                debug!(error = %e, "failed to clear page controls");
            }
        });
    }
}

fn invocation(
    guild_id: Option<GuildId>,
    channel_id: ChannelId,
    user_id: UserId,
    member: Option<&Member>,
) -> Invocation {
    Invocation {
        guild_id: guild_id.map(|id| id.to_string()),
        channel_id: channel_id.to_string(),
        user_id: user_id.to_string(),
        member_roles: member
            .map(|m| m.roles.iter().map(|r| r.to_string()).collect())
            .unwrap_or_default(),
    }
}

fn message_response(embed: &Embed, ephemeral: bool) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .embed(create_embed(embed))
            .ephemeral(ephemeral),
    )
}

fn purge_modal(token: &str) -> CreateInteractionResponse {
    let input = CreateInputText::new(InputTextStyle::Short, "Type Y to confirm", "confirmation")
        .placeholder("Y")
        .required(true);
    CreateInteractionResponse::Modal(
        CreateModal::new(format!("{PURGE_MODAL_PREFIX}{token}"), "Purge all tasks?")
            .components(vec![CreateActionRow::InputText(input)]),
    )
}

async fn respond(ctx: &Context, command: &CommandInteraction, response: CreateInteractionResponse) {
    if let Err(e) = command.create_response(&ctx.http, response).await {
        warn!(error = %e, "failed to send command response");
    }
}

#[async_trait]
impl EventHandler for AutoDeleteHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
        match SlashCommand::set_global_commands(&ctx.http, vec![slash_command()]).await {
            Ok(commands) => info!(count = commands.len(), "registered slash commands"),
            Err(e) => warn!(error = %e, "failed to register slash commands"),
        }
        self.confirm_restart(&ctx).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let platform = SerenityPlatform::new(&ctx);
        let event = InboundEvent::MessageCreated {
            guild_id: msg.guild_id.map(|id| id.to_string()),
            channel_id: msg.channel_id.to_string(),
            author_is_bot: msg.author.bot,
        };
        if let Outcome::Pruned(report) = self.moderator.dispatch(&platform, event).await {
            debug!(
                channel_id = %msg.channel_id,
                deleted = report.deleted,
                aborted = ?report.aborted,
                "pruning pass finished"
            );
        }
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        let Some(user_id) = reaction.user_id else {
            return;
        };
        if user_id == ctx.cache.current_user().id {
            return;
        }
        let ReactionType::Unicode(emoji) = &reaction.emoji else {
            return;
        };

        let platform = SerenityPlatform::new(&ctx);
        let event = InboundEvent::ReactionAdded {
            message_id: reaction.message_id.to_string(),
            user_id: user_id.to_string(),
            emoji: emoji.clone(),
        };
        let Outcome::PageTurned { embed } = self.moderator.dispatch(&platform, event).await else {
            return;
        };
        if let Err(e) = reaction.delete(&ctx.http).await {
            debug!(error = %e, "failed to remove page reaction");
        }
        if let Some(embed) = embed {
            let edit = EditMessage::new().embed(create_embed(&embed));
            if let Err(e) = reaction
                .channel_id
                .edit_message(&ctx.http, reaction.message_id, edit)
                .await
            {
                warn!(error = %e, "failed to show list page");
            }
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => self.on_command(&ctx, &command).await,
            Interaction::Modal(modal) => self.on_modal(&ctx, &modal).await,
            _ => {},
        }
    }
}
