//! X API v2 tweet lookup
//!
//! Defines the lookup contract used by the media resolver, its error taxonomy
//! and the subset of the v2 payload the bot reads.

mod client;

pub use client::TwitterClient;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Expansions requested on every lookup
pub const EXPANSIONS: &str = "attachments.media_keys";
/// Media fields requested on every lookup
pub const MEDIA_FIELDS: &str = "url,preview_image_url,variants";

/// Problem type the API reports for deleted or unknown posts
const RESOURCE_NOT_FOUND: &str = "https://api.twitter.com/2/problems/resource-not-found";

/// Errors that can occur while looking up a post
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The API rejected the request because of its rate limit
    #[error("Rate limit exceeded (wait: {wait_secs:?}s)")]
    RateLimited {
        /// Seconds until the rate limit window resets, if the API said so
        wait_secs: Option<u64>,
    },
    /// The post does not exist or is not visible
    #[error("Post not found: {0}")]
    NotFound(String),
    /// Network failure, timeout or server-side error
    #[error("Transient error: {0}")]
    Transient(String),
    /// The response did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// Any other non-success status (bad token, forbidden, ...)
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Interface for the remote post lookup.
///
/// Implementations are shared between concurrently handled messages, so they
/// must be usable through `&self` without locking.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TweetLookup: Send + Sync {
    /// Fetch a post with its media attachments expanded
    async fn lookup_tweet(&self, post_id: &str) -> Result<TweetResponse, LookupError>;
}

/// Top-level body of `GET /2/tweets/:id`
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TweetResponse {
    /// The post itself, absent when the lookup failed
    #[serde(default)]
    pub data: Option<Tweet>,
    /// Expanded objects referenced by the post
    #[serde(default)]
    pub includes: Option<Includes>,
    /// Partial errors reported alongside (or instead of) `data`
    #[serde(default)]
    pub errors: Vec<ApiProblem>,
}

impl TweetResponse {
    /// True when the API reported the post as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.errors
            .iter()
            .any(|problem| problem.kind.as_deref() == Some(RESOURCE_NOT_FOUND))
    }
}

/// A post
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Tweet {
    /// Post identifier
    pub id: String,
    /// Post text
    #[serde(default)]
    pub text: String,
    /// Attachment references
    #[serde(default)]
    pub attachments: Option<Attachments>,
}

/// Attachment references of a post
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Attachments {
    /// Keys into `includes.media`
    #[serde(default)]
    pub media_keys: Vec<String>,
}

/// Expanded objects
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Includes {
    /// Media objects, present only when the post has attachments
    #[serde(default)]
    pub media: Option<Vec<Media>>,
}

/// One attached media object
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Media {
    /// Media key
    pub media_key: String,
    /// Media type
    #[serde(rename = "type")]
    pub kind: MediaType,
    /// Direct URL, set for photos
    #[serde(default)]
    pub url: Option<String>,
    /// Still preview, set for videos and GIFs
    #[serde(default)]
    pub preview_image_url: Option<String>,
    /// Encodings, set for videos and GIFs
    #[serde(default)]
    pub variants: Vec<Variant>,
}

/// Media type as reported by the API
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// Still image
    Photo,
    /// Video
    Video,
    /// GIF, delivered as a looping MP4
    AnimatedGif,
    /// Anything newer than this client
    #[serde(other)]
    Unknown,
}

/// One encoding of a video
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Variant {
    /// Bitrate in bits per second, absent for HLS playlists
    #[serde(default)]
    pub bit_rate: Option<u64>,
    /// MIME type of the encoding
    pub content_type: String,
    /// Download URL
    pub url: String,
}

/// Error object from the `errors` array
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiProblem {
    /// Short title
    #[serde(default)]
    pub title: Option<String>,
    /// Human-readable detail
    #[serde(default)]
    pub detail: Option<String>,
    /// Problem type URI
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Identifier of the resource the problem is about
    #[serde(default)]
    pub resource_id: Option<String>,
}
