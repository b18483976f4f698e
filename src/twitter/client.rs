use super::{LookupError, TweetLookup, TweetResponse, EXPANSIONS, MEDIA_FIELDS};
use crate::config::Settings;
use crate::utils::truncate_str;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client as HttpClient, StatusCode};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, instrument, warn};

/// Longest error body kept in error messages
const MAX_ERROR_BODY_CHARS: usize = 500;

/// reqwest-backed X API v2 client.
///
/// Built once at startup and shared read-only between message handlers.
pub struct TwitterClient {
    http: HttpClient,
    base_url: String,
    bearer_token: String,
}

impl TwitterClient {
    /// Create a client from settings.
    ///
    /// The lookup timeout bounds each attempt; the rate-limit retry loop sits
    /// above it.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let timeout = Duration::from_secs(settings.lookup_timeout_secs);
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| HttpClient::new());

        Self {
            http,
            base_url: settings.twitter_api_base_url.trim_end_matches('/').to_string(),
            bearer_token: settings.twitter_bearer_token.clone(),
        }
    }

    fn tweet_url(&self, post_id: &str) -> String {
        format!("{}/tweets/{post_id}", self.base_url)
    }
}

#[async_trait]
impl TweetLookup for TwitterClient {
    #[instrument(skip(self))]
    async fn lookup_tweet(&self, post_id: &str) -> Result<TweetResponse, LookupError> {
        let response = self
            .http
            .get(self.tweet_url(post_id))
            .query(&[("expansions", EXPANSIONS), ("media.fields", MEDIA_FIELDS)])
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .map_err(|e| LookupError::Transient(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let wait_secs = parse_rate_limit_wait(response.headers());
            let body = response.text().await.unwrap_or_default();
            let error = classify_status(status, wait_secs, &body);
            warn!(%status, error = %error, "Tweet lookup failed");
            return Err(error);
        }

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Transient(e.without_url().to_string()))?;
        debug!(bytes = body.len(), "Tweet lookup succeeded");

        serde_json::from_str(&body).map_err(|e| LookupError::Malformed(e.to_string()))
    }
}

/// Map a non-success status to the lookup error taxonomy.
fn classify_status(status: StatusCode, wait_secs: Option<u64>, body: &str) -> LookupError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return LookupError::RateLimited { wait_secs };
    }

    // Detect HTML error pages from proxies
    let trimmed = body.trim_start();
    let detail = if trimmed.starts_with("<!DOCTYPE")
        || trimmed.starts_with("<html")
        || trimmed.starts_with("<HTML")
    {
        format!("{status} (Server returned HTML error page)")
    } else {
        format!("{status} - {}", truncate_str(body, MAX_ERROR_BODY_CHARS))
    };

    if status == StatusCode::NOT_FOUND {
        LookupError::NotFound(detail)
    } else if status.is_server_error() {
        LookupError::Transient(detail)
    } else {
        LookupError::Rejected(detail)
    }
}

/// Seconds until the rate-limit window reopens.
///
/// Prefers `retry-after`, then the `x-rate-limit-reset` epoch timestamp.
fn parse_rate_limit_wait(headers: &HeaderMap) -> Option<u64> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
    };

    if let Some(secs) = header("retry-after") {
        return Some(secs);
    }

    let reset_at = header("x-rate-limit-reset")?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(reset_at.saturating_sub(now))
}
