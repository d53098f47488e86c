//! Serenity-backed [`MessageHistory`] and [`GuildDirectory`].

use std::{num::NonZeroU64, sync::Arc};

use {
    async_trait::async_trait,
    autodelete_channels::{Error, GuildDirectory, HistoryMessage, MessageHistory, Result},
    serenity::{
        all::{Cache, ChannelId, Context, GetMessages, GuildId, Http, Message, MessageId, RoleId},
        http::HttpError,
        model::ModelError,
    },
    tracing::debug,
};

/// Most messages a single history request may return.
const HISTORY_PAGE: usize = 100;

/// Platform handles for one event.
pub struct SerenityPlatform {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl SerenityPlatform {
    pub fn new(ctx: &Context) -> Self {
        Self {
            http: Arc::clone(&ctx.http),
            cache: Arc::clone(&ctx.cache),
        }
    }
}

/// Parse a snowflake id.
pub fn parse_id<T: From<NonZeroU64>>(raw: &str) -> Result<T> {
    raw.parse::<NonZeroU64>()
        .map(T::from)
        .map_err(|_| Error::invalid_input(format!("invalid id: {raw:?}")))
}

fn to_history(message: &Message) -> HistoryMessage {
    HistoryMessage {
        id: message.id.to_string(),
        pinned: message.pinned,
        author_is_bot: message.author.bot,
        embed_count: message.embeds.len(),
    }
}

/// Map a serenity failure onto the channel error kinds.
pub fn classify(context: &str, error: serenity::Error) -> Error {
    let forbidden = match &error {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            response.status_code.as_u16() == 403
        },
        serenity::Error::Model(ModelError::InvalidPermissions { .. }) => true,
        _ => false,
    };
    if forbidden {
        Error::forbidden(context)
    } else {
        Error::request(context, error)
    }
}

#[async_trait]
impl MessageHistory for SerenityPlatform {
    async fn recent_messages(&self, channel_id: &str, limit: usize) -> Result<Vec<HistoryMessage>> {
        let channel: ChannelId = parse_id(channel_id)?;
        let mut collected = Vec::with_capacity(limit.min(HISTORY_PAGE * 4));
        let mut before: Option<MessageId> = None;

        while collected.len() < limit {
            let batch = (limit - collected.len()).min(HISTORY_PAGE);
            let mut request = GetMessages::new().limit(batch as u8);
            if let Some(before) = before {
                request = request.before(before);
            }
            let page = channel
                .messages(&self.http, request)
                .await
                .map_err(|e| classify("fetch channel history", e))?;

            collected.extend(page.iter().map(to_history));
            before = page.last().map(|message| message.id);
            if page.len() < batch || before.is_none() {
                break;
            }
        }
        debug!(channel_id, limit, fetched = collected.len(), "fetched history");
        Ok(collected)
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<()> {
        let channel: ChannelId = parse_id(channel_id)?;
        let message: MessageId = parse_id(message_id)?;
        channel
            .delete_message(&self.http, message)
            .await
            .map_err(|e| classify("delete message", e))
    }
}

impl GuildDirectory for SerenityPlatform {
    fn guild_of_channel(&self, channel_id: &str) -> Option<String> {
        let channel: ChannelId = parse_id(channel_id).ok()?;
        self.cache
            .channel(channel)
            .map(|channel| channel.guild_id.to_string())
    }

    fn role_exists(&self, guild_id: &str, role_id: &str) -> bool {
        let (Ok(guild), Ok(role)) = (parse_id::<GuildId>(guild_id), parse_id::<RoleId>(role_id))
        else {
            return false;
        };
        self.cache
            .guild(guild)
            .is_some_and(|guild| guild.roles.contains_key(&role))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("123", Some(123))]
    #[case("0", None)]
    #[case("-1", None)]
    #[case("<#123>", None)]
    #[case("", None)]
    fn parses_snowflakes(#[case] raw: &str, #[case] expected: Option<u64>) {
        let parsed = parse_id::<ChannelId>(raw).ok().map(|id| id.get());
        assert_eq!(parsed, expected);
    }

    #[test]
    fn permission_errors_are_forbidden() {
        let error = serenity::Error::Model(ModelError::InvalidPermissions {
            required: serenity::all::Permissions::MANAGE_MESSAGES,
            present: serenity::all::Permissions::empty(),
        });
        assert!(classify("delete message", error).is_forbidden());
    }

    #[test]
    fn other_errors_are_request_failures() {
        let error = serenity::Error::Other("gateway closed");
        assert!(!classify("fetch channel history", error).is_forbidden());
    }
}
