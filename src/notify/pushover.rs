use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::info;

use super::{Notifier, PushNote};
use crate::fetch::{backoff_delay, retryable_status, Throttle};

const NOTIFY_SPACING: Duration = Duration::from_secs(1);

/// Pushover delivery. Retries transient failures with the same backoff as
/// the fetch side — the endpoint tolerates duplicate delivery, so a retried
/// POST is safe.
pub struct PushoverNotifier {
    api_url: String,
    token: String,
    user: String,
    client: Client,
    throttle: Throttle,
    timeout: Duration,
    max_retries: u8,
}

impl PushoverNotifier {
    pub fn new(api_url: String, token: String, user: String) -> Self {
        Self {
            api_url,
            token,
            user,
            client: Client::new(),
            throttle: Throttle::new(NOTIFY_SPACING),
            timeout: Duration::from_secs(30),
            max_retries: 4,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }
}

#[async_trait::async_trait]
impl Notifier for PushoverNotifier {
    async fn send(&self, note: &PushNote) -> Result<()> {
        self.throttle.wait().await;

        let params = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("title", note.title.as_str()),
            ("message", note.message.as_str()),
            ("sound", "falling"),
            ("url", note.url.as_str()),
        ];

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let result = self
                .client
                .post(&self.api_url)
                .timeout(self.timeout)
                .form(&params)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        info!(title = %note.title, "sent push");
                        return Ok(());
                    }
                    if retryable_status(status) && attempt < self.max_retries {
                        tokio::time::sleep(backoff_delay(attempt)).await;
                        continue;
                    }
                    let body = response.text().await.unwrap_or_default();
                    return Err(anyhow!("pushover returned {status}: {body}"));
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(backoff_delay(attempt)).await;
                        continue;
                    }
                    return Err(anyhow!("pushover request failed: {e}"));
                }
            }
        }
    }
}
