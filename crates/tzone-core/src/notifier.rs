//! Notification formatting and fan-out
//!
//! Every announcement is the same three-embed message: one embed per zone
//! record and a static attribution footer.
//!
//! ```json
//! {"embeds": [
//!   {"title": "Current Terror Zone", "color": 65280,    "image": {"url": "..."}},
//!   {"title": "Next Terror Zone",    "color": 16711680, "image": {"url": "..."}},
//!   {"description": "TZone-BOT",     "color": 16777215}
//! ]}
//! ```
//!
//! Delivery to all sinks is best-effort: a failing webhook is logged and the
//! remaining webhooks are still attempted. Nothing is retried here.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{ZonePair, ZoneRecord};
use crate::sinks::SinkConfig;
use crate::traits::WebhookSink;

/// Color of the attribution embed
const FOOTER_COLOR: u32 = 0xFFFFFF;

/// Image block of an embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

/// One embed of the notification message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
}

impl Embed {
    /// Embed for one zone record
    ///
    /// Records without an image get no image block at all.
    pub fn zone(record: &ZoneRecord) -> Self {
        Self {
            title: Some(record.role.title().to_string()),
            description: None,
            color: record.role.color(),
            image: (!record.image_url.is_empty()).then(|| EmbedImage {
                url: record.image_url.clone(),
            }),
        }
    }

    /// Static attribution embed
    pub fn footer(text: &str) -> Self {
        Self {
            title: None,
            description: Some(text.to_string()),
            color: FOOTER_COLOR,
            image: None,
        }
    }
}

/// Full HTTP body posted to each webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub embeds: Vec<Embed>,
}

impl NotificationPayload {
    pub fn build(current: &ZoneRecord, next: &ZoneRecord, footer: &str) -> Self {
        Self {
            embeds: vec![Embed::zone(current), Embed::zone(next), Embed::footer(footer)],
        }
    }
}

/// Where a notification goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyTarget {
    /// Every configured webhook, in order
    AllSinks,
    /// One specific webhook (used for the debug preview)
    Url(String),
}

/// Formats announcements and delivers them through a [`WebhookSink`]
pub struct Notifier {
    sink: Box<dyn WebhookSink>,
    sinks: SinkConfig,
    footer: String,
}

impl Notifier {
    pub fn new(sink: Box<dyn WebhookSink>, sinks: SinkConfig, footer: impl Into<String>) -> Self {
        Self {
            sink,
            sinks,
            footer: footer.into(),
        }
    }

    /// Deliver the announcement for `current` / `next`
    ///
    /// # Returns
    ///
    /// - `AllSinks`: `Ok(true)` if every webhook accepted, `Ok(false)` if any
    ///   failed (all are still attempted); `Err` only when none are configured
    /// - `Url`: `Ok(true)` on success, `Err(Error::Notify)` otherwise
    pub async fn notify(
        &self,
        current: &ZoneRecord,
        next: &ZoneRecord,
        target: NotifyTarget,
    ) -> Result<bool> {
        let payload = NotificationPayload::build(current, next, &self.footer);

        match target {
            NotifyTarget::Url(url) => {
                self.sink.post(&url, &payload).await?;
                Ok(true)
            }
            NotifyTarget::AllSinks => {
                if self.sinks.webhooks.is_empty() {
                    return Err(Error::notify(self.sink.sink_name(), "No webhooks configured"));
                }

                let mut failed = 0;
                for (i, url) in self.sinks.webhooks.iter().enumerate() {
                    match self.sink.post(url, &payload).await {
                        Ok(()) => debug!("Delivered to webhook #{}", i + 1),
                        Err(e) => {
                            warn!("Delivery to webhook #{} failed: {}", i + 1, e);
                            failed += 1;
                        }
                    }
                }

                if failed == 0 {
                    info!(
                        "Announced {} / {} to {} webhook(s)",
                        current.name,
                        next.name,
                        self.sinks.webhooks.len()
                    );
                }
                Ok(failed == 0)
            }
        }
    }

    /// Send `pair` to the debug webhook, if one is configured
    ///
    /// Independent of change detection and of the `AllSinks` outcome.
    pub async fn preview(&self, pair: &ZonePair) -> Option<bool> {
        let url = self.sinks.debug_webhook.clone()?;
        match self
            .notify(&pair.current, &pair.next, NotifyTarget::Url(url))
            .await
        {
            Ok(delivered) => Some(delivered),
            Err(e) => {
                warn!("Debug preview failed: {}", e);
                Some(false)
            }
        }
    }

    pub fn sinks(&self) -> &SinkConfig {
        &self.sinks
    }
}
