use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

pub const DEFAULT_PREFIX: &str = "trp!";
pub const DEFAULT_STATUS: &str = "with your files";

/// Configuration for a single Discord bot account.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DiscordAccountConfig {
    /// Bot token from the Discord developer portal.
    pub token: Secret<String>,

    /// Text every command starts with.
    pub command_prefix: String,

    /// Shown as "Playing ..." while the bot is online.
    pub status_text: String,
}

impl std::fmt::Debug for DiscordAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordAccountConfig")
            .field("token", &"[REDACTED]")
            .field("command_prefix", &self.command_prefix)
            .field("status_text", &self.status_text)
            .finish()
    }
}

impl Default for DiscordAccountConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            command_prefix: DEFAULT_PREFIX.into(),
            status_text: DEFAULT_STATUS.into(),
        }
    }
}

impl DiscordAccountConfig {
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}
