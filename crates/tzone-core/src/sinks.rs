//! Notification sink configuration
//!
//! Webhook URLs come either from a JSON file:
//!
//! ```json
//! { "webhooks": [ { "url": "https://discord.com/api/webhooks/..." } ],
//!   "debug_webhook": "https://discord.com/api/webhooks/..." }
//! ```
//!
//! or from `WEBHOOK1, WEBHOOK2, ...` (read until the first missing index) plus
//! an optional `DEBUG_WEBHOOK`.
//!
//! Webhook URLs embed their credentials, so they never appear in `Debug`
//! output or logs.

use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Deserialize)]
struct WebhookEntry {
    url: String,
}

#[derive(Deserialize)]
struct SinkFile {
    webhooks: Vec<WebhookEntry>,
    #[serde(default)]
    debug_webhook: Option<String>,
}

/// Ordered webhook list plus one optional debug/preview webhook
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SinkConfig {
    pub webhooks: Vec<String>,
    pub debug_webhook: Option<String>,
}

// Custom Debug implementation that hides the webhook URLs
impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkConfig")
            .field("webhooks", &format!("<{} REDACTED>", self.webhooks.len()))
            .field(
                "debug_webhook",
                &self.debug_webhook.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

impl SinkConfig {
    pub fn new(webhooks: Vec<String>, debug_webhook: Option<String>) -> Self {
        Self {
            webhooks,
            debug_webhook,
        }
    }

    /// Parse the JSON sink file format
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: SinkFile = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid webhook file: {}", e)))?;

        Ok(Self {
            webhooks: file.webhooks.into_iter().map(|w| w.url).collect(),
            debug_webhook: file.debug_webhook.filter(|url| !url.is_empty()),
        })
    }

    /// Load a JSON sink file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read webhook file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Read `WEBHOOK<n>` and `DEBUG_WEBHOOK` from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read `WEBHOOK<n>` and `DEBUG_WEBHOOK` through `lookup`
    ///
    /// Indices start at 1 and must be contiguous: the first missing or empty
    /// `WEBHOOK<n>` ends the list.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhooks = (1..)
            .map(|i| lookup(&format!("WEBHOOK{}", i)))
            .take_while(|url| url.as_ref().is_some_and(|u| !u.is_empty()))
            .flatten()
            .collect();

        Self {
            webhooks,
            debug_webhook: lookup("DEBUG_WEBHOOK").filter(|url| !url.is_empty()),
        }
    }

    /// Validate the sink configuration
    pub fn validate(&self) -> Result<()> {
        if self.webhooks.is_empty() {
            return Err(Error::config("No webhooks configured"));
        }

        for (i, url) in self.webhooks.iter().chain(self.debug_webhook.iter()).enumerate() {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(Error::config(format!(
                    "Webhook #{} must use HTTP or HTTPS scheme",
                    i + 1
                )));
            }
        }

        Ok(())
    }
}
