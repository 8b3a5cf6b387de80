//! Config schema types.
use std::{collections::HashMap, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrpConfig {
    pub media: MediaConfig,
    pub channels: ChannelsConfig,
}

/// Media processing settings shared by every channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Scratch directory for staged inputs and tool outputs. Created at startup.
    pub scratch_dir: PathBuf,
    /// Largest declared attachment size accepted for staging, in bytes.
    pub max_input_bytes: u64,
    /// How many recent channel messages to scan for an attachment.
    pub history_window: usize,
    /// ffmpeg executable (bare name resolved through `PATH`).
    pub ffmpeg_path: PathBuf,
    /// ffprobe executable used for reply metadata. `None` disables probing.
    pub ffprobe_path: Option<PathBuf>,
}

/// 25 MB, the attachment ceiling.
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 25 * 1024 * 1024;

pub const DEFAULT_HISTORY_WINDOW: usize = 50;

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from("tmp"),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            history_window: DEFAULT_HISTORY_WINDOW,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: Some(PathBuf::from("ffprobe")),
        }
    }
}

/// Chat platform accounts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// Discord bot accounts, keyed by account ID. Each value is decoded by
    /// the Discord crate into its account config.
    #[serde(default)]
    pub discord: HashMap<String, serde_json::Value>,
}

const SECRET_KEYS: &[&str] = &["token"];

impl TrpConfig {
    /// Copy of the config with secret values in channel accounts masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for account in copy.channels.discord.values_mut() {
            if let Some(map) = account.as_object_mut() {
                for key in SECRET_KEYS {
                    if let Some(value) = map.get_mut(*key) {
                        *value = serde_json::Value::String("[REDACTED]".into());
                    }
                }
            }
        }
        copy
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_defaults() {
        let cfg = MediaConfig::default();
        assert_eq!(cfg.max_input_bytes, 26_214_400);
        assert_eq!(cfg.history_window, 50);
        assert_eq!(cfg.scratch_dir, PathBuf::from("tmp"));
        assert_eq!(cfg.ffmpeg_path, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: TrpConfig = toml::from_str(
            r#"
            [media]
            history_window = 10

            [channels.discord.main]
            token = "secret"
            command_prefix = "!"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.media.history_window, 10);
        assert_eq!(cfg.media.max_input_bytes, DEFAULT_MAX_INPUT_BYTES);
        assert_eq!(cfg.channels.discord["main"]["command_prefix"], "!");
    }

    #[test]
    fn redacted_masks_tokens_only() {
        let mut cfg = TrpConfig::default();
        cfg.channels.discord.insert(
            "main".into(),
            serde_json::json!({ "token": "secret", "command_prefix": "trp!" }),
        );
        let shown = cfg.redacted();
        assert_eq!(shown.channels.discord["main"]["token"], "[REDACTED]");
        assert_eq!(shown.channels.discord["main"]["command_prefix"], "trp!");
        assert_eq!(cfg.channels.discord["main"]["token"], "secret");
    }
}
