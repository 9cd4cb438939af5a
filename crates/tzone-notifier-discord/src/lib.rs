// # Discord Webhook Sink
//
// This crate delivers TZone announcements to Discord webhooks.
//
// ## Behavior
//
// - ✅ One POST per call, JSON body `{"embeds": [...]}`
// - ✅ Success is exactly `204 No Content`, which Discord returns for
//   webhook executions without `?wait=true`
// - ✅ HTTP timeout configured (30 seconds by default)
// - ❌ NO retry logic (a failed webhook waits for the next announcement)
// - ❌ NO fan-out (owned by `Notifier`)
//
// ## Security Requirements
//
// - Webhook URLs embed the webhook token: they NEVER appear in logs or errors
// - reqwest errors are stripped of their URL before being reported
//
// ## API Reference
//
// - Execute Webhook: POST `/webhooks/:id/:token`

use async_trait::async_trait;
use std::time::Duration;
use tzone_core::traits::WebhookSink;
use tzone_core::{Error, NotificationPayload, Result};

/// Default HTTP timeout for webhook requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const SINK_NAME: &str = "discord";

/// Discord webhook sink
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot. Which webhooks to call, and what a failure
/// means for the hour, is decided by the caller.
#[derive(Clone)]
pub struct DiscordWebhookSink {
    client: reqwest::Client,
    timeout: Duration,
}

// Custom Debug implementation that skips the HTTP client
impl std::fmt::Debug for DiscordWebhookSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordWebhookSink")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl DiscordWebhookSink {
    /// Create a sink with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a sink with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl WebhookSink for DiscordWebhookSink {
    async fn post(&self, url: &str, payload: &NotificationPayload) -> Result<()> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                Error::notify(SINK_NAME, format!("HTTP request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            tracing::trace!("Discord accepted webhook payload");
            return Ok(());
        }

        // Map HTTP status codes to specific errors
        let message = match status.as_u16() {
            401 | 403 => format!("Webhook token rejected. Status: {}", status),
            404 => format!("Webhook not found (deleted?). Status: {}", status),
            429 => format!("Rate limited by Discord. Status: {}", status),
            400 => {
                let detail = response
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|body| body["message"].as_str().map(str::to_string))
                    .unwrap_or_else(|| "no details".to_string());
                format!("Payload rejected: {}. Status: {}", detail, status)
            }
            _ => format!("Unexpected status: {}", status),
        };

        Err(Error::notify(SINK_NAME, message))
    }

    fn sink_name(&self) -> &'static str {
        SINK_NAME
    }
}
