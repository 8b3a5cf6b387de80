//! Prefix command parsing and the static texts built from the action catalog.

use trp_media::{EditRequest, MediaKind, catalog};

/// A recognised command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Edit(EditRequest),
    /// A kind with no action, e.g. bare `trp!video`.
    Usage(MediaKind),
    Ping,
    RandNum,
    Help,
}

/// Parse `content` if it starts with `prefix`. Unknown command names and a
/// bare prefix yield `None`.
pub fn parse(prefix: &str, content: &str) -> Option<Command> {
    let rest = content.trim_start().strip_prefix(prefix)?;
    let mut words = rest.split_whitespace();
    let name = words.next()?.to_ascii_lowercase();

    match name.as_str() {
        "ping" => Some(Command::Ping),
        "randnum" => Some(Command::RandNum),
        "help" => Some(Command::Help),
        other => {
            let kind: MediaKind = other.parse().ok()?;
            match words.next() {
                Some(action) => Some(Command::Edit(EditRequest::new(
                    kind,
                    action,
                    words.next().map(String::from),
                ))),
                None => Some(Command::Usage(kind)),
            }
        },
    }
}

/// Reply for a kind given without an action.
pub fn usage_text(prefix: &str, kind: MediaKind) -> String {
    let actions: Vec<String> = catalog::actions_for(kind).map(|s| s.usage()).collect();
    format!(
        "Usage: `{prefix}{kind} <action> [value]`. Supported actions: {}.",
        actions.join(", ")
    )
}

/// `(title, body)` pairs for the help embed, one per kind plus general
/// commands.
pub fn help_sections(prefix: &str) -> Vec<(String, String)> {
    let mut sections: Vec<(String, String)> = MediaKind::ALL
        .into_iter()
        .map(|kind| {
            let lines: Vec<String> = catalog::actions_for(kind)
                .map(|spec| format!("`{prefix}{kind} {}` - {}", spec.usage(), spec.summary))
                .collect();
            (format!("{} Commands", capitalize(kind.as_str())), lines.join("\n"))
        })
        .collect();
    sections.push((
        "General Commands".into(),
        [
            format!("`{prefix}ping` - Test the bot's latency."),
            format!("`{prefix}randnum` - Chooses a random number."),
            format!("`{prefix}help` - Show this help message."),
        ]
        .join("\n"),
    ));
    sections
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
