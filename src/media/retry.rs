//! Rate-limit aware retry around media resolution.
//!
//! Only rate limiting is retried. Every backoff is announced to the user and
//! waited out with `tokio::time::sleep`, so only the task handling this
//! message is suspended.

use super::{MediaBundle, ReplyChannel};
use crate::config::Settings;
use crate::twitter::LookupError;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Final reply once every attempt was rate limited
pub const TOO_MANY_REQUESTS_TEXT: &str =
    "Sorry, there are too many requests right now. Please try again later.";

/// Progress notice sent before waiting out a rate limit.
#[must_use]
pub fn rate_limit_notice(delay: Duration) -> String {
    format!(
        "Hit the rate limit, retrying in {} seconds...",
        delay.as_secs()
    )
}

/// Bounds for the rate-limit retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total lookup attempts
    pub max_attempts: u32,
    /// Delay unit; attempt `n` waits `base_delay * (n + 1)`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Policy configured through `RATE_LIMIT_*` settings
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_attempts: settings.rate_limit_max_attempts,
            base_delay: Duration::from_secs(settings.rate_limit_base_delay_secs),
        }
    }

    /// Wait before the attempt following `attempt` (zero-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }
}

/// Result of a retried resolution that did not fail outright
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The post was resolved, possibly to an empty bundle
    Resolved(MediaBundle),
    /// Every attempt was rate limited; the user has already been told
    RateLimitExhausted,
}

/// Run `operation` until it stops being rate limited or attempts run out.
///
/// # Errors
///
/// Any lookup error other than `RateLimited` is returned immediately.
pub async fn with_retry<F, Fut>(
    policy: &RetryPolicy,
    reply: &dyn ReplyChannel,
    mut operation: F,
) -> Result<Resolution, LookupError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<MediaBundle, LookupError>>,
{
    for attempt in 0..policy.max_attempts {
        match operation().await {
            Ok(bundle) => {
                if attempt > 0 {
                    info!(attempt, "Lookup succeeded after rate limiting");
                }
                return Ok(Resolution::Resolved(bundle));
            }
            Err(LookupError::RateLimited { wait_secs }) => {
                if attempt + 1 >= policy.max_attempts {
                    break;
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_secs = delay.as_secs(),
                    api_wait_secs = ?wait_secs,
                    "Rate limited, backing off"
                );
                if let Err(e) = reply.send_text(&rate_limit_notice(delay)).await {
                    warn!(error = %e, "Failed to send rate limit notice");
                }
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }

    warn!(
        max_attempts = policy.max_attempts,
        "Rate limit retries exhausted"
    );
    if let Err(e) = reply.send_text(TOO_MANY_REQUESTS_TEXT).await {
        warn!(error = %e, "Failed to send rate limit exhaustion notice");
    }
    Ok(Resolution::RateLimitExhausted)
}
