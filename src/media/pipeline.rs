//! Per-message handling: match, resolve with retry, dispatch.

use super::{dispatch, link, retry, MediaResolver, ReplyChannel, Resolution, RetryPolicy};
use crate::twitter::TweetLookup;
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

/// Generic reply for lookup failures and unexpected errors
pub const FAILURE_TEXT: &str =
    "Something went wrong while processing the post. Please check that the link is correct.";

/// Terminal state of one handled message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a post link; nothing was sent
    Ignored,
    /// Media or a "no media" text was sent
    Dispatched,
    /// Every attempt was rate limited
    RateLimitExhausted,
    /// Lookup or sending failed; the generic failure text was attempted
    Failed,
}

/// Shared, read-only handler for incoming messages.
#[derive(Clone)]
pub struct MediaPipeline {
    resolver: MediaResolver,
    policy: RetryPolicy,
}

impl MediaPipeline {
    /// Create a pipeline over the shared lookup client
    #[must_use]
    pub fn new(lookup: Arc<dyn TweetLookup>, policy: RetryPolicy) -> Self {
        Self {
            resolver: MediaResolver::new(lookup),
            policy,
        }
    }

    /// Handle one incoming text message.
    ///
    /// Never fails: every error ends in [`Outcome::Failed`] after being
    /// logged and reported to the chat.
    pub async fn handle(&self, text: &str, reply: &dyn ReplyChannel) -> Outcome {
        let Some(post) = link::match_post(text) else {
            return Outcome::Ignored;
        };

        info!(post_id = %post.post_id, "Resolving media for post");

        match self.process(&post.post_id, reply).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(post_id = %post.post_id, error = %e, "Failed to process post");
                if let Err(send_err) = reply.send_text(FAILURE_TEXT).await {
                    error!(error = %send_err, "Failed to send failure notice");
                }
                Outcome::Failed
            }
        }
    }

    async fn process(&self, post_id: &str, reply: &dyn ReplyChannel) -> Result<Outcome> {
        let resolution =
            retry::with_retry(&self.policy, reply, || self.resolver.resolve(post_id)).await?;

        match resolution {
            Resolution::RateLimitExhausted => Ok(Outcome::RateLimitExhausted),
            Resolution::Resolved(bundle) => {
                dispatch::dispatch(&bundle, reply).await?;
                info!(post_id, items = bundle.len(), "Post media dispatched");
                Ok(Outcome::Dispatched)
            }
        }
    }
}
