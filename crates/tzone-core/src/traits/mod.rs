//! Core traits for the terror zone notifier
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ZoneSource`]: Fetch the current/next zone pair from upstream
//! - [`WebhookSink`]: Deliver one notification payload to one webhook
//! - [`StateStore`]: Persist the last announced snapshot

pub mod zone_source;
pub mod webhook_sink;
pub mod state_store;

pub use zone_source::ZoneSource;
pub use webhook_sink::WebhookSink;
pub use state_store::StateStore;
