//! Small helpers shared by the X client and the Telegram transport.

use std::time::Duration;
use teloxide::RequestError;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::warn;

/// Safely truncates a string to a maximum character length (not bytes).
///
/// This is UTF-8 safe and will not panic on multi-byte characters.
///
/// # Examples
///
/// ```
/// use x_media_relay::utils::truncate_str;
/// let s = "Привет, мир!";
/// assert_eq!(truncate_str(s, 6), "Привет");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Returns true for Telegram errors caused by the connection rather than by
/// the request itself.
#[must_use]
pub fn is_transient_request_error(error: &RequestError) -> bool {
    matches!(error, RequestError::Network(_) | RequestError::Io(_))
}

/// Retry a Telegram API operation with exponential backoff.
///
/// Only network-level failures are retried. API rejections (unreachable media
/// URL, file too large, chat not found) are returned on the first attempt.
///
/// # Errors
///
/// Returns the last error once the retries are exhausted, or the first
/// non-transient error.
///
/// # Examples
///
/// ```no_run
/// use teloxide::prelude::*;
/// use x_media_relay::utils::retry_transport_operation;
///
/// # async fn example(bot: Bot, chat_id: ChatId) -> Result<(), teloxide::RequestError> {
/// retry_transport_operation(|| async {
///     bot.send_message(chat_id, "hello").await
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_transport_operation<F, Fut, T>(operation: F) -> Result<T, RequestError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, RequestError>>,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter) // Add jitter to prevent thundering herd
        .take(TELEGRAM_API_MAX_RETRIES);

    RetryIf::start(retry_strategy, operation, is_transient_request_error)
        .await
        .map_err(|e| {
            warn!(error = %e, "Telegram API operation failed");
            e
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use teloxide::types::ChatId;

    #[test]
    fn test_truncate_str_unicode() {
        let s = "Привет, мир!";
        assert_eq!(truncate_str(s, 6), "Привет");
        assert_eq!(truncate_str(s, 50), "Привет, мир!");
    }

    #[tokio::test]
    async fn test_non_transient_errors_are_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result: Result<(), RequestError> = retry_transport_operation(|| {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                Err(RequestError::MigrateToChatId(ChatId(-100_123)))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
