//! On-disk document types.
//!
//! Channel entries sit at the top level of the document, keyed by channel id,
//! next to two reserved keys:
//!
//! ```json
//! {
//!   "1234": { "limit": 5, "pins": false, "embeds": false, "enabled": true, "guild": "42" },
//!   "management_roles": { "42": ["777"] },
//!   "deleted_message_count": { "1234": 12 }
//! }
//! ```
//!
//! Ids are written as strings. Older documents stored them as integers, so
//! both forms are accepted on load.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Reserved top-level key holding guild id → management role ids.
pub const MANAGEMENT_ROLES_KEY: &str = "management_roles";

/// Reserved top-level key holding channel id → total pruned messages.
pub const DELETED_COUNT_KEY: &str = "deleted_message_count";

/// Per-channel retention rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Maximum number of countable messages kept in the channel.
    pub limit: u32,

    /// Pinned messages are exempt from counting and deletion.
    #[serde(default, rename = "pins")]
    pub keep_pinned: bool,

    /// Bot-authored messages carrying an embed are exempt.
    #[serde(default, rename = "embeds")]
    pub keep_bot_embeds: bool,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Guild owning the channel.
    #[serde(rename = "guild", deserialize_with = "id_string")]
    pub guild_id: String,
}

impl RetentionPolicy {
    pub fn new(guild_id: impl Into<String>, limit: u32) -> Self {
        Self {
            limit,
            keep_pinned: false,
            keep_bot_embeds: false,
            enabled: true,
            guild_id: guild_id.into(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// The complete persisted configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default, deserialize_with = "role_map")]
    pub management_roles: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub deleted_message_count: BTreeMap<String, u64>,

    /// Channel id → policy. Every key that is not reserved lands here.
    #[serde(flatten)]
    pub policies: BTreeMap<String, RetentionPolicy>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn role_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, Vec<String>>, D::Error> {
    let raw = BTreeMap::<String, Vec<RawId>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(guild, roles)| (guild, roles.into_iter().map(String::from).collect()))
        .collect())
}
