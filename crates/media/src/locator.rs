//! Finds the file a command applies to.

use {
    tracing::{debug, warn},
    trp_channels::{CommandContext, MediaRef},
};

use crate::{Error, Result};

/// Where a candidate file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSource {
    /// Attached to the command message itself.
    Attachment,
    /// Attached to the message the command replies to.
    ReplyTarget,
    /// Attached to a recent message in the conversation.
    History,
}

impl MediaSource {
    /// Sources in priority order. The first one that yields a file wins.
    pub const RESOLUTION_ORDER: [Self; 3] = [Self::Attachment, Self::ReplyTarget, Self::History];

    async fn lookup(self, ctx: &dyn CommandContext, window: usize) -> Result<Option<MediaRef>> {
        match self {
            Self::Attachment => Ok(ctx.attachments().first().cloned()),
            Self::ReplyTarget => match ctx.referenced_message().await {
                Ok(msg) => Ok(msg.and_then(|m| m.attachments.into_iter().next())),
                Err(e) => {
                    // A deleted or inaccessible reply target falls through to history.
                    warn!(error = %e, "failed to fetch referenced message");
                    Ok(None)
                },
            },
            Self::History => {
                if window == 0 {
                    return Ok(None);
                }
                let messages = ctx
                    .recent_messages(window)
                    .await
                    .map_err(|e| Error::staging("failed to read channel history", e))?;
                Ok(messages
                    .into_iter()
                    .take(window)
                    .find_map(|m| m.attachments.into_iter().next()))
            },
        }
    }
}

/// A resolved candidate and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub media: MediaRef,
    pub source: MediaSource,
}

/// Resolve the single best candidate for a command, or `None` when nothing
/// in reach has an attachment. No type filtering happens here.
pub async fn locate(ctx: &dyn CommandContext, history_window: usize) -> Result<Option<Located>> {
    for source in MediaSource::RESOLUTION_ORDER {
        if let Some(media) = source.lookup(ctx, history_window).await? {
            debug!(?source, filename = %media.filename, size = media.size, "located media");
            return Ok(Some(Located { media, source }));
        }
    }
    Ok(None)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testing::{FakeContext, media, message},
    };

    #[tokio::test]
    async fn own_attachment_wins() {
        let ctx = FakeContext::default()
            .with_attachments(vec![media("a.mp4"), media("b.mp4")])
            .with_reference(message("r", vec![media("reply.mp4")]))
            .with_history(vec![message("h", vec![media("history.mp4")])]);

        let found = locate(&ctx, 50).await.unwrap().unwrap();
        assert_eq!(found.media.filename, "a.mp4");
        assert_eq!(found.source, MediaSource::Attachment);
        assert_eq!(ctx.history_requests(), 0);
    }

    #[tokio::test]
    async fn reply_target_beats_newer_history() {
        let ctx = FakeContext::default()
            .with_reference(message("r", vec![media("reply.mov")]))
            .with_history(vec![
                message("h1", vec![media("newest.mp4")]),
                message("h2", vec![media("older.mp4")]),
            ]);

        let found = locate(&ctx, 50).await.unwrap().unwrap();
        assert_eq!(found.media.filename, "reply.mov");
        assert_eq!(found.source, MediaSource::ReplyTarget);
    }

    #[tokio::test]
    async fn reply_without_attachment_falls_back_to_history() {
        let ctx = FakeContext::default()
            .with_reference(message("r", vec![]))
            .with_history(vec![message("h1", vec![media("clip.webm")])]);

        let found = locate(&ctx, 50).await.unwrap().unwrap();
        assert_eq!(found.source, MediaSource::History);
    }

    #[tokio::test]
    async fn failed_reply_fetch_falls_back_to_history() {
        let ctx = FakeContext::default()
            .with_failing_reference()
            .with_history(vec![message("h1", vec![media("clip.webm")])]);

        let found = locate(&ctx, 50).await.unwrap().unwrap();
        assert_eq!(found.media.filename, "clip.webm");
    }

    #[tokio::test]
    async fn third_most_recent_message_is_found() {
        let ctx = FakeContext::default().with_history(vec![
            message("1", vec![]),
            message("2", vec![]),
            message("3", vec![media("third.png"), media("other.png")]),
            message("4", vec![media("fourth.png")]),
        ]);

        let found = locate(&ctx, 50).await.unwrap().unwrap();
        assert_eq!(found.media.filename, "third.png");
        assert_eq!(found.source, MediaSource::History);
    }

    #[tokio::test]
    async fn history_scan_respects_window() {
        let ctx = FakeContext::default().with_history(vec![
            message("1", vec![]),
            message("2", vec![]),
            message("3", vec![media("late.png")]),
        ]);

        assert_eq!(locate(&ctx, 2).await.unwrap(), None);
        assert_eq!(locate(&ctx, 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn nothing_found_is_not_an_error() {
        let ctx = FakeContext::default().with_history(vec![message("1", vec![])]);
        assert_eq!(locate(&ctx, 50).await.unwrap(), None);
    }
}
