// # Webhook Sink Trait
//
// Defines the interface for delivering a notification payload to one webhook.
//
// ## Implementations
//
// - Discord: `tzone-notifier-discord` crate
//
// Fan-out across the configured webhooks is owned by `Notifier`, not by sinks.

use async_trait::async_trait;

use crate::error::Result;
use crate::notifier::NotificationPayload;

/// Trait for webhook transports
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform exactly one POST to the given URL per call
/// - ✅ Decide what counts as success for the webhook contract
///
/// ## Forbidden Capabilities
/// - ❌ Retry, queue or batch deliveries
/// - ❌ Log the webhook URL (it embeds the webhook token)
#[async_trait]
pub trait WebhookSink: Send + Sync {
    /// Post `payload` to `url`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The webhook accepted the payload
    /// - `Err(Error::Notify)`: Transport failure or unexpected status
    async fn post(&self, url: &str, payload: &NotificationPayload) -> Result<()>;

    /// Name used in logs and errors
    fn sink_name(&self) -> &'static str;
}
