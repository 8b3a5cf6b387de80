//! Command context for running one edit against local files.

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use {
    async_trait::async_trait,
    tracing::debug,
    trp_channels::{ChannelMessage, CommandContext, Error, MediaRef, Result},
};

/// Presents `input` as the command's only attachment and writes the result
/// to `output`. Text replies go to stderr.
pub struct LocalContext {
    attachments: Vec<MediaRef>,
    output: PathBuf,
    last_note: Mutex<Option<String>>,
}

impl LocalContext {
    pub fn new(input: &Path, output: PathBuf) -> Result<Self> {
        let size = std::fs::metadata(input)?.len();
        let filename = input
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::invalid_input(format!("not a file: {}", input.display())))?
            .to_string();
        Ok(Self {
            attachments: vec![MediaRef {
                filename,
                size,
                handle: input.to_string_lossy().into_owned(),
            }],
            output,
            last_note: Mutex::new(None),
        })
    }

    /// Note sent with the delivered file, if one was delivered.
    pub fn delivered_note(&self) -> Option<String> {
        self.last_note.lock().ok().and_then(|n| n.clone())
    }
}

#[async_trait]
impl CommandContext for LocalContext {
    fn channel_type(&self) -> &str {
        "local"
    }

    fn attachments(&self) -> &[MediaRef] {
        &self.attachments
    }

    async fn referenced_message(&self) -> Result<Option<ChannelMessage>> {
        Ok(None)
    }

    async fn recent_messages(&self, _limit: usize) -> Result<Vec<ChannelMessage>> {
        Ok(Vec::new())
    }

    async fn download(&self, media: &MediaRef, dest: &Path, max_bytes: u64) -> Result<u64> {
        let size = tokio::fs::metadata(&media.handle).await?.len();
        if size > max_bytes {
            return Err(Error::invalid_input(format!(
                "{} is {size} bytes, limit is {max_bytes}",
                media.filename
            )));
        }
        let copied = tokio::fs::copy(&media.handle, dest).await?;
        debug!(from = %media.handle, to = %dest.display(), copied, "staged local file");
        Ok(copied)
    }

    async fn reply_text(&self, text: &str) -> Result<()> {
        eprintln!("{text}");
        Ok(())
    }

    async fn reply_file(&self, path: &Path, note: &str) -> Result<()> {
        tokio::fs::copy(path, &self.output).await?;
        if let Ok(mut last) = self.last_note.lock() {
            *last = Some(note.to_string());
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exposes_input_as_attachment_and_delivers_to_output() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("Clip.MP4");
        std::fs::write(&input, b"moov").unwrap();
        let output = tmp.path().join("result.mp4");
        let ctx = LocalContext::new(&input, output.clone()).unwrap();

        let media = &ctx.attachments()[0];
        assert_eq!(media.filename, "Clip.MP4");
        assert_eq!(media.size, 4);
        assert_eq!(media.extension().as_deref(), Some(".mp4"));

        let staged = tmp.path().join("staged.mp4");
        assert_eq!(ctx.download(media, &staged, 1024).await.unwrap(), 4);

        ctx.reply_file(&staged, "-# Took 0.10 seconds").await.unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"moov");
        assert_eq!(ctx.delivered_note().as_deref(), Some("-# Took 0.10 seconds"));
    }

    #[tokio::test]
    async fn download_respects_size_cap() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("big.wav");
        std::fs::write(&input, vec![0u8; 64]).unwrap();
        let ctx = LocalContext::new(&input, tmp.path().join("out.mp3")).unwrap();

        let err = ctx
            .download(&ctx.attachments()[0], &tmp.path().join("staged.wav"), 32)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[test]
    fn missing_input_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(LocalContext::new(&tmp.path().join("nope.png"), tmp.path().join("o.png")).is_err());
    }
}
