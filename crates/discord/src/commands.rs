//! `/autodelete` registration and option parsing.

use std::collections::HashMap;

use {
    autodelete_channels::{Error, Result},
    autodelete_moderation::{
        Command, ManagedCommand, PolicyUpdate,
        commands::{COMMANDS, NAMESPACE},
    },
    serenity::all::{
        CommandData, CommandOptionType, CreateCommand, CreateCommandOption, ResolvedOption,
        ResolvedValue,
    },
};

/// Option value with the platform types stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Channel(String),
}

type Options = HashMap<String, OptionValue>;

fn channel_option(required: bool) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Channel, "channel", "The channel of the task.")
        .required(required)
}

fn limit_option(required: bool) -> CreateCommandOption {
    CreateCommandOption::new(
        CommandOptionType::Integer,
        "limit",
        "Number of messages to keep.",
    )
    .min_int_value(0)
    .required(required)
}

fn flag(name: &str, description: &str) -> CreateCommandOption {
    CreateCommandOption::new(CommandOptionType::Boolean, name, description)
}

fn policy_flags(sub: CreateCommandOption) -> CreateCommandOption {
    sub.add_sub_option(flag("pins", "Keep pinned messages."))
        .add_sub_option(flag("embeds", "Keep embeds posted by bots."))
        .add_sub_option(flag("enabled", "Whether the task is active."))
}

/// The `/autodelete` command with every subcommand.
pub fn slash_command() -> CreateCommand {
    COMMANDS.iter().fold(
        CreateCommand::new(NAMESPACE).description("Automatically delete old messages."),
        |command, spec| {
            let sub = CreateCommandOption::new(
                CommandOptionType::SubCommand,
                spec.name,
                spec.description,
            );
            let sub = match spec.name {
                "setup" => sub.add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "roles",
                        "Mention the management roles, separated by spaces.",
                    )
                    .required(true),
                ),
                "add" => policy_flags(
                    sub.add_sub_option(channel_option(true))
                        .add_sub_option(limit_option(true)),
                ),
                "edit" => policy_flags(
                    sub.add_sub_option(channel_option(true))
                        .add_sub_option(limit_option(false)),
                ),
                "remove" => sub.add_sub_option(channel_option(true)),
                _ => sub,
            };
            command.add_option(sub)
        },
    )
}

/// Parse an `/autodelete` invocation.
pub fn parse(data: &CommandData) -> Result<Command> {
    let resolved = data.options();
    let Some(ResolvedOption {
        name,
        value: ResolvedValue::SubCommand(options),
        ..
    }) = resolved.first()
    else {
        return Err(Error::invalid_input("missing subcommand"));
    };

    let options: Options = options
        .iter()
        .filter_map(|option| {
            let value = match &option.value {
                ResolvedValue::Boolean(b) => OptionValue::Bool(*b),
                ResolvedValue::Integer(i) => OptionValue::Int(*i),
                ResolvedValue::String(s) => OptionValue::Text((*s).to_string()),
                ResolvedValue::Channel(channel) => OptionValue::Channel(channel.id.to_string()),
                _ => return None,
            };
            Some((option.name.to_string(), value))
        })
        .collect();
    build(name, &options)
}

/// Build a [`Command`] from a subcommand name and its options.
pub fn build(name: &str, options: &Options) -> Result<Command> {
    let managed = match name {
        "help" => return Ok(Command::Help),
        "setup" => {
            return Ok(Command::Setup {
                roles: text(options, "roles").unwrap_or_default(),
            });
        },
        "restart" => ManagedCommand::Restart,
        "add" => ManagedCommand::Add {
            channel_id: channel(options)?,
            limit: limit(options)?.ok_or_else(|| Error::invalid_input("limit is required"))?,
            keep_pinned: boolean(options, "pins").unwrap_or(false),
            keep_bot_embeds: boolean(options, "embeds").unwrap_or(false),
            enabled: boolean(options, "enabled").unwrap_or(true),
        },
        "remove" => ManagedCommand::Remove {
            channel_id: channel(options)?,
        },
        "list" => ManagedCommand::List,
        "edit" => ManagedCommand::Edit {
            channel_id: channel(options)?,
            update: PolicyUpdate {
                limit: limit(options)?,
                keep_pinned: boolean(options, "pins"),
                keep_bot_embeds: boolean(options, "embeds"),
                enabled: boolean(options, "enabled"),
            },
        },
        "stats" => ManagedCommand::Stats,
        "enable" => ManagedCommand::Enable,
        "disable" => ManagedCommand::Disable,
        "purge" => ManagedCommand::Purge,
        other => return Err(Error::invalid_input(format!("unknown subcommand: {other}"))),
    };
    Ok(Command::Managed(managed))
}

fn channel(options: &Options) -> Result<String> {
    match options.get("channel") {
        Some(OptionValue::Channel(id)) => Ok(id.clone()),
        _ => Err(Error::invalid_input("channel is required")),
    }
}

fn limit(options: &Options) -> Result<Option<u32>> {
    match options.get("limit") {
        Some(OptionValue::Int(value)) => u32::try_from(*value)
            .map(Some)
            .map_err(|_| Error::invalid_input(format!("limit out of range: {value}"))),
        _ => Ok(None),
    }
}

fn boolean(options: &Options, name: &str) -> Option<bool> {
    match options.get(name) {
        Some(OptionValue::Bool(value)) => Some(*value),
        _ => None,
    }
}

fn text(options: &Options, name: &str) -> Option<String> {
    match options.get(name) {
        Some(OptionValue::Text(value)) => Some(value.clone()),
        _ => None,
    }
}
