//! Resilient Telegram replies.
//!
//! [`TelegramReply`] implements [`ReplyChannel`] for the message being
//! answered. Every send quotes that message and is retried on network
//! failures through [`crate::utils::retry_transport_operation`].
//!
//! # Usage
//!
//! ```ignore
//! use x_media_relay::bot::resilient::TelegramReply;
//!
//! let reply = TelegramReply::new(bot.clone(), &msg);
//! reply.send_photo("https://pbs.twimg.com/media/abc.jpg").await?;
//! ```

use crate::media::{MediaItem, ReplyChannel};
use crate::utils::retry_transport_operation;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InputFile, InputMedia, InputMediaPhoto, InputMediaVideo, MessageId, ReplyParameters,
};

/// Reply channel bound to one incoming Telegram message
#[derive(Clone)]
pub struct TelegramReply {
    bot: Bot,
    chat_id: ChatId,
    reply_to: MessageId,
}

impl TelegramReply {
    /// Create a channel answering `msg`
    #[must_use]
    pub fn new(bot: Bot, msg: &Message) -> Self {
        Self {
            bot,
            chat_id: msg.chat.id,
            reply_to: msg.id,
        }
    }

    fn reply_parameters(&self) -> ReplyParameters {
        ReplyParameters::new(self.reply_to)
    }
}

/// Telegram downloads the media itself, so only a valid URL is needed.
fn input_file(url: &str) -> Result<InputFile> {
    let url = Url::parse(url).with_context(|| format!("Invalid media URL: {url}"))?;
    Ok(InputFile::url(url))
}

fn input_media(item: &MediaItem) -> Result<InputMedia> {
    let file = input_file(item.url())?;
    Ok(match item {
        MediaItem::Photo { .. } => InputMedia::Photo(InputMediaPhoto::new(file)),
        MediaItem::Video { .. } => InputMedia::Video(InputMediaVideo::new(file)),
    })
}

#[async_trait]
impl ReplyChannel for TelegramReply {
    async fn send_text(&self, text: &str) -> Result<()> {
        retry_transport_operation(|| async {
            self.bot
                .send_message(self.chat_id, text)
                .reply_parameters(self.reply_parameters())
                .await
        })
        .await
        .context("Telegram send error")?;
        Ok(())
    }

    async fn send_photo(&self, url: &str) -> Result<()> {
        let file = input_file(url)?;
        retry_transport_operation(|| async {
            self.bot
                .send_photo(self.chat_id, file.clone())
                .reply_parameters(self.reply_parameters())
                .await
        })
        .await
        .context("Telegram photo send error")?;
        Ok(())
    }

    async fn send_video(&self, url: &str) -> Result<()> {
        let file = input_file(url)?;
        retry_transport_operation(|| async {
            self.bot
                .send_video(self.chat_id, file.clone())
                .reply_parameters(self.reply_parameters())
                .await
        })
        .await
        .context("Telegram video send error")?;
        Ok(())
    }

    async fn send_media_group(&self, items: &[MediaItem]) -> Result<()> {
        let media = items.iter().map(input_media).collect::<Result<Vec<_>>>()?;
        retry_transport_operation(|| async {
            self.bot
                .send_media_group(self.chat_id, media.clone())
                .reply_parameters(self.reply_parameters())
                .await
        })
        .await
        .context("Telegram media group send error")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_media_matches_kind() -> Result<()> {
        let photo = input_media(&MediaItem::Photo {
            url: "https://pbs.twimg.com/media/a.jpg".to_string(),
        })?;
        assert!(matches!(photo, InputMedia::Photo(_)));

        let video = input_media(&MediaItem::Video {
            url: "https://video.twimg.com/a.mp4?tag=12".to_string(),
            bitrate: Some(2_176_000),
        })?;
        assert!(matches!(video, InputMedia::Video(_)));
        Ok(())
    }

    #[test]
    fn test_invalid_urls_are_rejected_before_sending() {
        assert!(input_file("not a url").is_err());
    }
}
