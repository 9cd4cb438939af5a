// # Zone Source Trait
//
// Defines the interface for fetching terror zone announcements.
//
// ## Implementations
//
// - HTTP: `tzone-source-http` crate
// - Tests: scripted sources in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use tzone_core::ZoneSource;
//
// let pair = source.fetch().await?;
// println!("now: {}, next: {}", pair.current.name, pair.next.name);
// ```

use async_trait::async_trait;

use crate::error::Result;
use crate::model::ZonePair;

/// Trait for zone source implementations
///
/// # Trust Level: Untrusted
///
/// Sources are single-shot upstream integrations.
///
/// ## Allowed Capabilities
/// - ✅ Perform one HTTP/HTTPS request to their endpoint per call
/// - ✅ Map raw identifiers through the zone directory
///
/// ## Forbidden Capabilities
/// - ❌ Retry or sleep (owned by `ZoneWatcher`)
/// - ❌ Compare against previous state (owned by `ZoneWatcher`)
/// - ❌ Return a partial pair: either both records or an error
#[async_trait]
pub trait ZoneSource: Send + Sync {
    /// Fetch the current and next zone
    ///
    /// # Returns
    ///
    /// - `Ok(ZonePair)`: Both records, timestamped
    /// - `Err(Error::Fetch)`: Transport failure, non-success status or bad body
    async fn fetch(&self) -> Result<ZonePair>;

    /// Name used in logs
    fn source_name(&self) -> &'static str;
}
