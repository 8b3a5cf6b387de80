//! In-memory command context and fake ffmpeg scripts for tests.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use {
    async_trait::async_trait,
    trp_channels::{ChannelMessage, CommandContext, Error, MediaRef, Result, TypingGuard},
};

pub fn media(filename: &str) -> MediaRef {
    MediaRef {
        filename: filename.into(),
        size: 1024,
        handle: format!("mem://{filename}"),
    }
}

pub fn message(id: &str, attachments: Vec<MediaRef>) -> ChannelMessage {
    ChannelMessage {
        id: id.into(),
        attachments,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    File { note: String, contents: Vec<u8> },
}

#[derive(Default)]
pub struct FakeContext {
    attachments: Vec<MediaRef>,
    reference: Option<ChannelMessage>,
    reference_fails: bool,
    history: Vec<ChannelMessage>,
    files: HashMap<String, Vec<u8>>,
    partial: HashSet<String>,
    fail_file_reply: bool,
    history_requests: AtomicUsize,
    downloads: AtomicUsize,
    typing: AtomicUsize,
    typing_live: Arc<AtomicUsize>,
    replied_while_typing: AtomicBool,
    replies: Mutex<Vec<Reply>>,
}

struct LiveTyping(Arc<AtomicUsize>);

impl Drop for LiveTyping {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeContext {
    pub fn with_attachments(mut self, attachments: Vec<MediaRef>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_reference(mut self, msg: ChannelMessage) -> Self {
        self.reference = Some(msg);
        self
    }

    pub fn with_failing_reference(mut self) -> Self {
        self.reference_fails = true;
        self
    }

    pub fn with_history(mut self, history: Vec<ChannelMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_file(mut self, media: &MediaRef, bytes: &[u8]) -> Self {
        self.files.insert(media.handle.clone(), bytes.to_vec());
        self
    }

    /// Download writes `bytes` and then fails, like a dropped connection.
    pub fn with_partial_download(mut self, media: &MediaRef, bytes: &[u8]) -> Self {
        self.partial.insert(media.handle.clone());
        self.with_file(media, bytes)
    }

    pub fn with_failing_file_reply(mut self) -> Self {
        self.fail_file_reply = true;
        self
    }

    pub fn history_requests(&self) -> usize {
        self.history_requests.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    /// Number of typing indicators started.
    pub fn typing_count(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }

    /// Whether any reply went out while an indicator was still up.
    pub fn replied_while_typing(&self) -> bool {
        self.replied_while_typing.load(Ordering::SeqCst)
    }

    fn note_reply(&self) {
        if self.typing_live.load(Ordering::SeqCst) > 0 {
            self.replied_while_typing.store(true, Ordering::SeqCst);
        }
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandContext for FakeContext {
    fn channel_type(&self) -> &str {
        "fake"
    }

    fn attachments(&self) -> &[MediaRef] {
        &self.attachments
    }

    async fn referenced_message(&self) -> Result<Option<ChannelMessage>> {
        if self.reference_fails {
            return Err(Error::not_found("Unknown Message"));
        }
        Ok(self.reference.clone())
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<ChannelMessage>> {
        self.history_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.history.iter().take(limit).cloned().collect())
    }

    async fn download(&self, media: &MediaRef, dest: &Path, max_bytes: u64) -> Result<u64> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .files
            .get(&media.handle)
            .ok_or_else(|| Error::not_found(&media.handle))?;
        if bytes.len() as u64 > max_bytes {
            return Err(Error::invalid_input("body larger than allowed"));
        }
        std::fs::write(dest, bytes)?;
        if self.partial.contains(&media.handle) {
            return Err(Error::unavailable("connection reset"));
        }
        Ok(bytes.len() as u64)
    }

    async fn reply_text(&self, text: &str) -> Result<()> {
        self.note_reply();
        self.replies.lock().unwrap().push(Reply::Text(text.into()));
        Ok(())
    }

    async fn reply_file(&self, path: &Path, note: &str) -> Result<()> {
        self.note_reply();
        if self.fail_file_reply {
            return Err(Error::invalid_input("Request entity too large"));
        }
        let contents = std::fs::read(path)?;
        self.replies.lock().unwrap().push(Reply::File {
            note: note.into(),
            contents,
        });
        Ok(())
    }

    fn start_typing(&self) -> TypingGuard {
        self.typing.fetch_add(1, Ordering::SeqCst);
        self.typing_live.fetch_add(1, Ordering::SeqCst);
        TypingGuard::new(LiveTyping(Arc::clone(&self.typing_live)))
    }
}

/// Writes its last argument, the output path.
pub const WRITING_TOOL: &str = r#"for last; do :; done
printf 'processed' > "$last"
"#;

/// Like [`WRITING_TOOL`], also recording its arguments as `args.txt` next
/// to the output.
pub const RECORDING_TOOL: &str = r#"for last; do :; done
printf '%s\n' "$@" > "$(dirname "$last")/args.txt"
printf 'processed' > "$last"
"#;

/// Copies its `-i` input to the output, so each job's result carries its
/// own input bytes.
pub const COPYING_TOOL: &str = r#"prev=
for arg; do
  if [ "$prev" = "-i" ]; then input=$arg; fi
  prev=$arg
done
cat "$input" > "$prev"
"#;

/// Fails the way ffmpeg does on a bad filter value.
pub const FAILING_TOOL: &str = r#"for last; do :; done
printf 'partial' > "$last"
printf 'Invalid hue value: out of range\nError applying filter\n' >&2
exit 1
"#;

/// Exits cleanly without producing anything.
pub const NOOP_TOOL: &str = "exit 0\n";

/// Path to an executable shell script running `body`.
///
/// Scripts are written once per process into a shared directory; writing
/// an executable while other test threads fork can fail with ETXTBSY.
#[cfg(unix)]
pub fn fake_tool(_scratch: &Path, body: &'static str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    static TOOLS: OnceLock<PathBuf> = OnceLock::new();
    let dir = TOOLS.get_or_init(|| {
        let dir = std::env::temp_dir().join(format!("trp-fake-tools-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, script) in [
            ("writing", WRITING_TOOL),
            ("recording", RECORDING_TOOL),
            ("copying", COPYING_TOOL),
            ("failing", FAILING_TOOL),
            ("noop", NOOP_TOOL),
        ] {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{script}")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        dir
    });

    let name = match body {
        WRITING_TOOL => "writing",
        RECORDING_TOOL => "recording",
        COPYING_TOOL => "copying",
        FAILING_TOOL => "failing",
        _ => "noop",
    };
    dir.join(name)
}
