// # tzone-core
//
// Core library for the terror zone notifier.
//
// ## Architecture Overview
//
// This library provides the core functionality for terror zone announcements:
// - **ZoneSource**: Trait for fetching the current/next zone pair from upstream
// - **WebhookSink**: Trait for delivering a notification payload to one webhook
// - **StateStore**: Trait for persisting the last announced snapshot
// - **Notifier**: Builds the notification payload and fans it out to all sinks
// - **ZoneWatcher**: Hourly scheduler that detects changes and triggers notifications
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Decisions live here, transports live in plugin crates
// 2. **Single-Shot Plugins**: Sources and sinks never retry or keep state
// 3. **Library-First**: The daemon is a thin integration layer over this crate
// 4. **Idempotency**: A snapshot is persisted only after a successful notification

pub mod traits;
pub mod model;
pub mod directory;
pub mod sinks;
pub mod notifier;
pub mod watcher;
pub mod clock;
pub mod config;
pub mod error;
pub mod state;

// Re-export core types for convenience
pub use traits::{ZoneSource, WebhookSink, StateStore};
pub use model::{StateSnapshot, ZoneId, ZonePair, ZoneRecord, ZoneRole};
pub use directory::{ZoneDirectory, ZoneEntry};
pub use sinks::SinkConfig;
pub use notifier::{NotificationPayload, Notifier, NotifyTarget};
pub use watcher::{ZoneStatus, ZoneWatcher, WatcherEvent};
pub use clock::{Clock, SystemClock};
pub use config::{ScheduleConfig, SourceConfig, StateStoreConfig};
pub use error::{Error, Result};
pub use state::{MemoryStateStore, FileStateStore};
