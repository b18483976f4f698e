//! Link-to-media resolution pipeline
//!
//! `link` recognizes post URLs, `resolver` turns a post into a [`MediaBundle`],
//! `retry` absorbs rate limits, `dispatch` replies with the media and
//! `pipeline` ties them together for one incoming message.

pub mod dispatch;
pub mod link;
pub mod pipeline;
pub mod resolver;
pub mod retry;

pub use link::{match_post, PostReference};
pub use pipeline::{MediaPipeline, Outcome};
pub use resolver::MediaResolver;
pub use retry::{with_retry, Resolution, RetryPolicy};

use anyhow::Result;
use async_trait::async_trait;

/// Kind of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Still image
    Photo,
    /// MP4 video
    Video,
}

/// One downloadable media reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaItem {
    /// Photo at its original URL
    Photo {
        /// Image URL
        url: String,
    },
    /// Best MP4 encoding of a video or GIF
    Video {
        /// MP4 URL
        url: String,
        /// Bitrate of the selected encoding, if the API reported one
        bitrate: Option<u64>,
    },
}

impl MediaItem {
    /// Kind of this item
    #[must_use]
    pub const fn kind(&self) -> MediaKind {
        match self {
            Self::Photo { .. } => MediaKind::Photo,
            Self::Video { .. } => MediaKind::Video,
        }
    }

    /// Download URL
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Photo { url } | Self::Video { url, .. } => url,
        }
    }
}

/// Media extracted from one post, photos first and videos second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaBundle {
    photos: Vec<MediaItem>,
    videos: Vec<MediaItem>,
    has_media: bool,
}

impl MediaBundle {
    /// Bundle for a post whose response carried no media expansion at all
    #[must_use]
    pub fn without_media() -> Self {
        Self::default()
    }

    /// Empty bundle for a post that does have attachments
    #[must_use]
    pub fn with_media() -> Self {
        Self {
            has_media: true,
            ..Self::default()
        }
    }

    /// Append an item, keeping photos ahead of videos.
    pub fn push(&mut self, item: MediaItem) {
        match item.kind() {
            MediaKind::Photo => self.photos.push(item),
            MediaKind::Video => self.videos.push(item),
        }
    }

    /// False when the post has no media attachments at all
    #[must_use]
    pub const fn has_media(&self) -> bool {
        self.has_media
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.photos.len() + self.videos.len()
    }

    /// True when nothing downloadable was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items in dispatch order
    pub fn items(&self) -> impl Iterator<Item = &MediaItem> {
        self.photos.iter().chain(self.videos.iter())
    }
}

/// Outbound side of a chat, scoped to the message being answered.
///
/// Implemented over Telegram in [`crate::bot::resilient::TelegramReply`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    /// Send a plain text reply
    async fn send_text(&self, text: &str) -> Result<()>;
    /// Send a single photo by URL
    async fn send_photo(&self, url: &str) -> Result<()>;
    /// Send a single video by URL
    async fn send_video(&self, url: &str) -> Result<()>;
    /// Send several media items as one grouped message, in order
    async fn send_media_group(&self, items: &[MediaItem]) -> Result<()>;
}
