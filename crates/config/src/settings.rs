//! Process-level settings resolved from the environment.

use std::path::PathBuf;

use secrecy::{ExposeSecret, Secret};

use crate::{Error, Result};

/// Environment variable holding the bot token.
pub const TOKEN_ENV: &str = "DISCORD_TOKEN";

/// Environment variable holding the custom status text.
pub const STATUS_ENV: &str = "BOT_STATUS";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "AUTODELETE_CONFIG";

pub const DEFAULT_STATUS: &str = "AutoDeleteBot";
pub const DEFAULT_CONFIG_FILE: &str = "autodelete_config.json";

/// Settings needed to connect and to locate the configuration document.
#[derive(Clone)]
pub struct BotSettings {
    pub token: Secret<String>,
    /// Custom presence text shown under the bot's name.
    pub status: String,
    pub config_path: PathBuf,
}

impl BotSettings {
    /// Build settings, failing when the token is absent or blank.
    pub fn new(
        token: Option<String>,
        status: Option<String>,
        config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::missing_credential(TOKEN_ENV))?;
        Ok(Self {
            token: Secret::new(token),
            status: status
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STATUS.into()),
            config_path: config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
        })
    }

    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl std::fmt::Debug for BotSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotSettings")
            .field("token", &"[REDACTED]")
            .field("status", &self.status)
            .field("config_path", &self.config_path)
            .finish()
    }
}
