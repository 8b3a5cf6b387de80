//! [`CommandContext`] backed by one Discord message.

use std::{path::Path, sync::Arc};

use {
    async_trait::async_trait,
    serenity::{
        all::{Attachment, GetMessages, Http, Message},
        builder::{CreateAttachment, CreateMessage},
    },
    tracing::debug,
    trp_channels::{ChannelMessage, CommandContext, MediaRef, Result, TypingGuard},
};

use crate::{download::download_to, error::Error};

/// Discord rejects message content longer than this, in characters.
pub const MESSAGE_LIMIT: usize = 2000;

/// Discord returns at most this many messages per history request.
const HISTORY_PAGE_LIMIT: usize = 100;

fn media_ref(attachment: &Attachment) -> MediaRef {
    MediaRef {
        filename: attachment.filename.clone(),
        size: u64::from(attachment.size),
        handle: attachment.url.clone(),
    }
}

fn channel_message(msg: &Message) -> ChannelMessage {
    ChannelMessage {
        id: msg.id.to_string(),
        attachments: msg.attachments.iter().map(media_ref).collect(),
    }
}

/// How a text reply goes out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextReply {
    Inline(String),
    /// Too long to inline; `summary` as content, the full text as `error.txt`.
    Attached { summary: String, body: String },
}

pub fn fit_message(text: &str) -> TextReply {
    if text.chars().count() <= MESSAGE_LIMIT {
        return TextReply::Inline(text.to_string());
    }
    let first_line: String = text.lines().next().unwrap_or_default().chars().take(200).collect();
    TextReply::Attached {
        summary: format!("{first_line}\n-# Full output attached."),
        body: text.to_string(),
    }
}

/// One command invocation on Discord.
pub struct DiscordCommandContext {
    http: Arc<Http>,
    client: reqwest::Client,
    msg: Message,
    attachments: Vec<MediaRef>,
}

impl DiscordCommandContext {
    pub fn new(http: Arc<Http>, client: reqwest::Client, msg: Message) -> Self {
        let attachments = msg.attachments.iter().map(media_ref).collect();
        Self {
            http,
            client,
            msg,
            attachments,
        }
    }

    pub fn message(&self) -> &Message {
        &self.msg
    }

    pub fn http(&self) -> &Http {
        &self.http
    }

    async fn send(&self, builder: CreateMessage) -> std::result::Result<(), Error> {
        self.msg
            .channel_id
            .send_message(self.http(), builder.reference_message(&self.msg))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CommandContext for DiscordCommandContext {
    fn channel_type(&self) -> &str {
        "discord"
    }

    fn attachments(&self) -> &[MediaRef] {
        &self.attachments
    }

    async fn referenced_message(&self) -> Result<Option<ChannelMessage>> {
        if let Some(referenced) = &self.msg.referenced_message {
            return Ok(Some(channel_message(referenced)));
        }
        let Some(message_id) = self
            .msg
            .message_reference
            .as_ref()
            .and_then(|r| r.message_id)
        else {
            return Ok(None);
        };
        let fetched = self
            .msg
            .channel_id
            .message(self.http(), message_id)
            .await
            .map_err(Error::from)?;
        Ok(Some(channel_message(&fetched)))
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<ChannelMessage>> {
        let page = limit.min(HISTORY_PAGE_LIMIT) as u8;
        let messages = self
            .msg
            .channel_id
            .messages(self.http(), GetMessages::new().before(self.msg.id).limit(page))
            .await
            .map_err(Error::from)?;
        debug!(requested = limit, returned = messages.len(), "fetched channel history");
        Ok(messages.iter().map(channel_message).collect())
    }

    async fn download(&self, media: &MediaRef, dest: &Path, max_bytes: u64) -> Result<u64> {
        Ok(download_to(&self.client, &media.handle, dest, max_bytes).await?)
    }

    async fn reply_text(&self, text: &str) -> Result<()> {
        let builder = match fit_message(text) {
            TextReply::Inline(content) => CreateMessage::new().content(content),
            TextReply::Attached { summary, body } => CreateMessage::new()
                .content(summary)
                .add_file(CreateAttachment::bytes(body.into_bytes(), "error.txt")),
        };
        Ok(self.send(builder).await?)
    }

    async fn reply_file(&self, path: &Path, note: &str) -> Result<()> {
        let attachment = CreateAttachment::path(path).await.map_err(Error::from)?;
        Ok(self
            .send(CreateMessage::new().content(note).add_file(attachment))
            .await?)
    }

    fn start_typing(&self) -> TypingGuard {
        // Serenity re-sends the indicator every few seconds until dropped.
        TypingGuard::new(self.msg.channel_id.start_typing(&self.http))
    }
}
