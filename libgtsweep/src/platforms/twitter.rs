//! Twitter v1.1 REST API client
//!
//! Uses the three status endpoints a sweep needs: the authenticated user's
//! timeline, status destroy and unretweet. All requests ask for
//! `tweet_mode=extended` so the full text of long posts is returned.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::credentials::CredentialSet;
use crate::error::{PlatformError, Result};
use crate::oauth::OAuth1Signer;
use crate::platforms::Timeline;
use crate::types::TimelineItem;

/// Base URL of the v1.1 API
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com/1.1";

/// Twitter error code for "No status found with that ID"
const NO_STATUS_FOUND: u32 = 144;

/// Unix timestamp at which the current rate-limit window ends
const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Authenticated Twitter client
///
/// Every request is signed with the credentials it was built from. Building
/// a client performs no network round-trip; bad credentials only show up as
/// `PlatformError::Authentication` on the first request.
#[derive(Debug)]
pub struct TwitterClient {
    http: Client,
    signer: OAuth1Signer,
    base_url: String,
    username: String,
}

impl TwitterClient {
    /// Create a client bound to the public API
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Network` if the HTTP client cannot be built
    /// (for example when no TLS backend is available).
    pub fn new(credentials: &CredentialSet) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("gtsweep/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            signer: OAuth1Signer::new(credentials),
            base_url: DEFAULT_API_BASE.to_string(),
            username: credentials.username().to_string(),
        })
    }

    /// Point the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<Url, PlatformError> {
        let raw = format!("{}/{}", self.base_url, path);
        Url::parse_with_params(&raw, query)
            .map_err(|e| PlatformError::Api(format!("Invalid API URL '{}': {}", raw, e)))
    }

    async fn send<T>(
        &self,
        method: Method,
        url: Url,
        context: &str,
    ) -> std::result::Result<T, PlatformError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let auth_header = self.signer.authorization_header(method.as_str(), url.as_str())?;
        debug!(method = %method, url = %url, "Sending request");

        let response = self
            .http
            .request(method, url)
            .header(header::AUTHORIZATION, auth_header)
            .send()
            .await
            .map_err(|e| map_transport_error(e, context))?;

        let status = response.status();
        let retry_after = rate_limit_reset(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, context))?;

        if !status.is_success() {
            return Err(map_status_error(status, &body, context, retry_after));
        }

        serde_json::from_str(&body).map_err(|e| {
            PlatformError::Api(format!("Unexpected response during {}: {}", context, e))
        })
    }
}

#[async_trait]
impl Timeline for TwitterClient {
    async fn fetch_page(
        &self,
        count: u32,
    ) -> std::result::Result<Vec<TimelineItem>, PlatformError> {
        let url = self.endpoint(
            "statuses/user_timeline.json",
            &[
                ("count", count.to_string()),
                ("include_rts", "true".to_string()),
                ("tweet_mode", "extended".to_string()),
            ],
        )?;

        let tweets: Vec<ApiTweet> = self.send(Method::GET, url, "fetch timeline").await?;
        Ok(tweets.into_iter().map(TimelineItem::from).collect())
    }

    async fn destroy(&self, id: u64) -> std::result::Result<TimelineItem, PlatformError> {
        let url = self.endpoint(
            &format!("statuses/destroy/{}.json", id),
            &[("tweet_mode", "extended".to_string())],
        )?;

        let tweet: ApiTweet = self.send(Method::POST, url, "delete status").await?;
        Ok(tweet.into())
    }

    async fn unretweet(&self, id: u64) -> std::result::Result<TimelineItem, PlatformError> {
        let url = self.endpoint(
            &format!("statuses/unretweet/{}.json", id),
            &[("tweet_mode", "extended".to_string())],
        )?;

        let tweet: ApiTweet = self.send(Method::POST, url, "unretweet status").await?;
        Ok(tweet.into())
    }

    fn name(&self) -> &str {
        "twitter"
    }
}

/// Status object as returned by the v1.1 API (only the fields we read)
#[derive(Debug, Deserialize)]
struct ApiTweet {
    id: u64,
    #[serde(default)]
    full_text: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    retweeted: bool,
    #[serde(default)]
    retweeted_status: Option<serde_json::Value>,
}

impl From<ApiTweet> for TimelineItem {
    fn from(tweet: ApiTweet) -> Self {
        TimelineItem {
            id: tweet.id,
            text: tweet.full_text.or(tweet.text).unwrap_or_default(),
            is_repost: tweet.retweeted || tweet.retweeted_status.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrors {
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    code: u32,
    message: String,
}

/// Time until the rate-limit window resets, if the response says
fn rate_limit_reset(headers: &HeaderMap) -> Option<Duration> {
    let reset: u64 = headers
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();

    (reset > now).then(|| Duration::from_secs(reset - now))
}

fn map_transport_error(error: reqwest::Error, context: &str) -> PlatformError {
    PlatformError::Network(format!("Request failed during {}: {}", context, error))
}

/// Map a non-success response to PlatformError
///
/// - 401/403 → `Authentication`
/// - 404, or error code 144 → `NotFound`
/// - 429 → `RateLimit`, carrying the time until the window resets
/// - 5xx → `Network`
/// - anything else → `Api`
fn map_status_error(
    status: StatusCode,
    body: &str,
    context: &str,
    retry_after: Option<Duration>,
) -> PlatformError {
    let api_errors = serde_json::from_str::<ApiErrors>(body)
        .map(|e| e.errors)
        .unwrap_or_default();

    let detail = if api_errors.is_empty() {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status.to_string()
        } else {
            format!("{}: {}", status, trimmed)
        }
    } else {
        let messages: Vec<String> = api_errors
            .iter()
            .map(|e| format!("{} (code {})", e.message, e.code))
            .collect();
        format!("{}: {}", status, messages.join("; "))
    };

    let message = format!("{} failed: {}", context, detail);

    if api_errors.iter().any(|e| e.code == NO_STATUS_FOUND) {
        return PlatformError::NotFound(message);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PlatformError::Authentication(format!(
            "{}. Check the consumer and access credentials.",
            message
        )),
        StatusCode::NOT_FOUND => PlatformError::NotFound(message),
        StatusCode::TOO_MANY_REQUESTS => PlatformError::RateLimit {
            message,
            retry_after,
        },
        s if s.is_server_error() => PlatformError::Network(message),
        _ => PlatformError::Api(message),
    }
}
