use std::path::Path;

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

use crate::Result;

/// A file attached to a channel message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub filename: String,
    /// Size declared by the platform, in bytes.
    pub size: u64,
    /// Platform-specific retrieval handle (CDN URL, local path). Only the
    /// adapter that produced it knows how to resolve it.
    pub handle: String,
}

impl MediaRef {
    /// Lower-cased filename extension including the leading dot (`".mp4"`).
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
    }
}

/// The parts of a channel message the media locator cares about.
#[derive(Debug, Clone, Default)]
pub struct ChannelMessage {
    pub id: String,
    pub attachments: Vec<MediaRef>,
}

/// Keeps a "typing" indicator visible until dropped.
#[derive(Default)]
pub struct TypingGuard(Option<Box<dyn Send>>);

impl TypingGuard {
    /// Wrap a platform handle whose `Drop` stops the indicator.
    pub fn new(handle: impl Send + 'static) -> Self {
        Self(Some(Box::new(handle)))
    }
}

/// One inbound command, as seen by the media core.
///
/// Implemented per platform. A context lives for exactly one command
/// invocation and replies into the conversation the command came from.
#[async_trait]
pub trait CommandContext: Send + Sync {
    /// Channel identifier (e.g. "discord", "local").
    fn channel_type(&self) -> &str;

    /// Attachments on the invoking message, in platform order.
    fn attachments(&self) -> &[MediaRef];

    /// The message the invoking message replies to, if it is a reply.
    async fn referenced_message(&self) -> Result<Option<ChannelMessage>>;

    /// Up to `limit` messages preceding the invoking one, newest first.
    async fn recent_messages(&self, limit: usize) -> Result<Vec<ChannelMessage>>;

    /// Write the bytes behind `media` to `dest`. Fails without writing more
    /// than `max_bytes` if the body turns out larger than declared.
    async fn download(&self, media: &MediaRef, dest: &Path, max_bytes: u64) -> Result<u64>;

    /// Reply with plain text.
    async fn reply_text(&self, text: &str) -> Result<()>;

    /// Reply with a file and a short note.
    async fn reply_file(&self, path: &Path, note: &str) -> Result<()>;

    /// Show a "typing" indicator until the guard is dropped. No-op by default.
    fn start_typing(&self) -> TypingGuard {
        TypingGuard::default()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
    };

    fn media(filename: &str) -> MediaRef {
        MediaRef {
            filename: filename.into(),
            size: 1,
            handle: String::new(),
        }
    }

    #[test]
    fn extension_is_lowercased_with_dot() {
        assert_eq!(media("Clip.MP4").extension().as_deref(), Some(".mp4"));
        assert_eq!(media("song.final.wav").extension().as_deref(), Some(".wav"));
    }

    #[test]
    fn typing_guard_drops_its_handle() {
        struct Flag(Arc<AtomicBool>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let stopped = Arc::new(AtomicBool::new(false));
        let guard = TypingGuard::new(Flag(Arc::clone(&stopped)));
        assert!(!stopped.load(Ordering::SeqCst));
        drop(guard);
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[test]
    fn extension_missing() {
        assert_eq!(media("README").extension(), None);
        assert_eq!(media(".hidden").extension(), None);
    }
}
