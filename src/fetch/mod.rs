// src/fetch/mod.rs
pub mod error;
pub mod throttle;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::ingest::types::{AlertDetail, FeedDocument};
pub use error::FetchError;
pub use throttle::Throttle;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u8 = 4;

/// Feed and detail fetches keep at least this much spacing; pushes at least
/// one second.
const FETCH_SPACING: Duration = Duration::from_secs(2);

/// Statuses worth retrying under the shared backoff policy.
pub(crate) fn retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

pub(crate) fn backoff_delay(attempt: u8) -> Duration {
    Duration::from_millis(500u64 << (attempt - 1))
}

/// Outbound read side of the pipeline. A trait seam so tests can feed the
/// pipeline canned documents.
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// `Ok(None)` is a soft upstream failure: maintenance page, non-2xx.
    async fn fetch_feed(&self) -> Result<Option<FeedDocument>, FetchError>;

    /// Detail fields for one alert; `Ok(None)` under the same soft-failure
    /// guards as the feed.
    async fn fetch_detail(
        &self,
        alert_id: &str,
        url: &str,
    ) -> Result<Option<AlertDetail>, FetchError>;
}

/// HTTP client for the NOAA alert API: feed retrieval and per-alert detail
/// lookups, under one retry policy and per-operation throttles.
pub struct NoaaClient {
    client: Client,
    feed_url: String,
    user_agent: String,
    feed_throttle: Throttle,
    detail_throttle: Throttle,
}

impl NoaaClient {
    pub fn new(feed_url: String, user_agent: String) -> Self {
        Self {
            client: Client::new(),
            feed_url,
            user_agent,
            feed_throttle: Throttle::new(FETCH_SPACING),
            detail_throttle: Throttle::new(FETCH_SPACING),
        }
    }

    /// GET with bounded retries. Retryable statuses back off and try again;
    /// once attempts run out the last response is returned as-is and the
    /// caller's status guard decides what it means.
    async fn get_with_retry(
        &self,
        url: &str,
        context: &'static str,
    ) -> Result<Response, FetchError> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let result = self
                .client
                .get(url)
                .header(USER_AGENT, &self.user_agent)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await;

            match result {
                Ok(response) => {
                    if retryable_status(response.status()) && attempt < MAX_ATTEMPTS {
                        warn!(
                            status = %response.status(),
                            attempt,
                            context,
                            "retryable status, backing off"
                        );
                        tokio::time::sleep(backoff_delay(attempt)).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) => {
                    if attempt < MAX_ATTEMPTS {
                        warn!(error = ?e, attempt, context, "request error, backing off");
                        tokio::time::sleep(backoff_delay(attempt)).await;
                        continue;
                    }
                    return Err(FetchError::Transient { context, source: e });
                }
            }
        }
    }
}

/// An upstream maintenance page must not crash the run: flag anything that
/// announces itself as HTML, by content type or by body.
fn looks_like_html(content_type: &str, body: &str) -> bool {
    if content_type.contains("text/html") {
        return true;
    }
    let trimmed = body.trim_start();
    let head: String = trimmed
        .chars()
        .take("<!doctype html".len())
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

fn content_type_of(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[derive(Debug, Default, Deserialize)]
struct DetailDocument {
    #[serde(default)]
    properties: DetailProperties,
}

#[derive(Debug, Default, Deserialize)]
struct DetailProperties {
    #[serde(default)]
    headline: String,
    #[serde(default)]
    event: String,
    #[serde(rename = "senderName", default)]
    sender_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    instruction: String,
    #[serde(rename = "areaDesc", default)]
    area_desc: String,
}

#[async_trait]
impl AlertSource for NoaaClient {
    async fn fetch_feed(&self) -> Result<Option<FeedDocument>, FetchError> {
        self.feed_throttle.wait().await;
        info!("fetching alerts feed");

        let response = self.get_with_retry(&self.feed_url, "alerts feed").await?;
        let status = response.status();
        let content_type = content_type_of(&response);
        let body = response.text().await.map_err(|e| FetchError::Transient {
            context: "alerts feed",
            source: e,
        })?;

        if !status.is_success() {
            warn!(status = %status, "failed to fetch alerts feed");
            return Ok(None);
        }
        if looks_like_html(&content_type, &body) {
            warn!("expected JSON but alerts feed returned HTML");
            return Ok(None);
        }

        let document: FeedDocument =
            serde_json::from_str(&body).map_err(|e| FetchError::MalformedPayload {
                context: "alerts feed",
                source: e,
            })?;
        Ok(Some(document))
    }

    async fn fetch_detail(
        &self,
        alert_id: &str,
        url: &str,
    ) -> Result<Option<AlertDetail>, FetchError> {
        self.detail_throttle.wait().await;
        info!(alert_id, "fetching detail link for alert");

        let response = self.get_with_retry(url, "alert detail").await?;
        let content_type = content_type_of(&response);
        let body = response.text().await.map_err(|e| FetchError::Transient {
            context: "alert detail",
            source: e,
        })?;

        if looks_like_html(&content_type, &body) {
            warn!(alert_id, "expected JSON but alert detail returned HTML");
            return Ok(None);
        }

        let document: DetailDocument =
            serde_json::from_str(&body).map_err(|e| FetchError::MalformedPayload {
                context: "alert detail",
                source: e,
            })?;
        let p = document.properties;
        Ok(Some(AlertDetail {
            headline: p.headline,
            event: p.event,
            issuer: p.sender_name,
            description: p.description,
            instructions: p.instruction,
            area: p.area_desc,
        }))
    }
}
