use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::TrpConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["trp.toml", "trp.yaml", "trp.yml", "trp.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<TrpConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./trp.{toml,yaml,yml,json}`
/// 2. `~/.config/trp/trp.{toml,yaml,yml,json}`
///
/// Returns `TrpConfig::default()` if no config file is found or the file
/// cannot be parsed.
pub fn discover_and_load() -> TrpConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    TrpConfig::default()
}

fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/trp/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "trp").map(|d| d.config_dir().to_path_buf())
}

/// Apply `TRP_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: TrpConfig) -> TrpConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: TrpConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> TrpConfig {
    if let Some(dir) = lookup("TRP_SCRATCH_DIR").filter(|v| !v.is_empty()) {
        config.media.scratch_dir = PathBuf::from(dir);
    }
    if let Some(path) = lookup("TRP_FFMPEG_PATH").filter(|v| !v.is_empty()) {
        config.media.ffmpeg_path = PathBuf::from(path);
    }
    config
}

fn parse_config(raw: &str, path: &Path) -> Result<TrpConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).context("invalid TOML config"),
        "yaml" | "yml" => serde_yaml::from_str(raw).context("invalid YAML config"),
        "json" => serde_json::from_str(raw).context("invalid JSON config"),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_toml_with_env_placeholders_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trp.toml");
        std::fs::write(
            &path,
            "[media]\nscratch_dir = \"${TRP_TEST_UNSET_SCRATCH_VAR}\"\nhistory_window = 5\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.media.history_window, 5);
        assert_eq!(
            cfg.media.scratch_dir,
            PathBuf::from("${TRP_TEST_UNSET_SCRATCH_VAR}")
        );
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("trp.yaml");
        std::fs::write(&yaml, "media:\n  max_input_bytes: 1024\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().media.max_input_bytes, 1024);

        let json = dir.path().join("trp.json");
        std::fs::write(&json, r#"{"channels":{"discord":{"a":{"token":"t"}}}}"#).unwrap();
        let cfg = load_config(&json).unwrap();
        assert!(cfg.channels.discord.contains_key("a"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trp.ini");
        std::fs::write(&path, "x=1").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat(ref ext)) if ext == "ini"
        ));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_config(Path::new("/nonexistent/trp.toml")).unwrap_err();
        let Error::Message(message) = err else {
            panic!("expected a message error, got {err:?}");
        };
        assert!(message.starts_with("failed to read /nonexistent/trp.toml: "), "{message}");
    }

    #[test]
    fn env_overrides_replace_paths() {
        let cfg = apply_env_overrides_with(TrpConfig::default(), |name| match name {
            "TRP_SCRATCH_DIR" => Some("/scratch".into()),
            "TRP_FFMPEG_PATH" => Some(String::new()),
            _ => None,
        });
        assert_eq!(cfg.media.scratch_dir, PathBuf::from("/scratch"));
        assert_eq!(cfg.media.ffmpeg_path, PathBuf::from("ffmpeg"));
    }
}
