// # HTTP Zone Source
//
// This crate provides the upstream terror zone source for the TZone notifier.
//
// ## Purpose
//
// One call to `fetch()` makes exactly one GET to the zone API and turns the
// answer into a timestamped current/next pair:
//
// ```json
// { "current": [5, 12], "next": [9], "duration": 60 }
// ```
//
// - Identifiers are resolved through the `ZoneDirectory`, first match wins
// - Unmapped lists fall back to `"Zone <first id>"` with no image
// - `duration` is minutes until the next zone takes over (default 0)
//
// ## Timestamps
//
// Both records are anchored to the rotation boundary upstream reports, the
// hour nearest to `now + duration`:
//
// - `Next` takes effect at that boundary
// - `Current` took effect one hour earlier
//
// The stamp only moves when upstream moves its countdown, so a response that
// still describes the previous rotation right after the hour compares equal to
// the snapshot announced for it.
//
// ## Not Done Here
//
// No retries, no caching, no comparison with earlier fetches. The watcher
// in `tzone-core` owns all of that.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use tzone_core::clock::{Clock, SystemClock, hour_round};
use tzone_core::config::SourceConfig;
use tzone_core::traits::ZoneSource;
use tzone_core::{Error, Result, ZoneDirectory, ZoneId, ZonePair, ZoneRecord, ZoneRole};

/// Raw upstream answer; unknown fields are ignored
#[derive(Debug, Deserialize)]
struct ZoneResponse {
    current: Vec<ZoneId>,
    next: Vec<ZoneId>,
    #[serde(default)]
    duration: Option<f64>,
}

/// Terror zone source backed by the upstream HTTP API
pub struct HttpZoneSource {
    /// Endpoint URL
    url: String,

    /// Identifier-to-name mapping
    directory: Arc<ZoneDirectory>,

    /// Time source for effective timestamps
    clock: Arc<dyn Clock>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpZoneSource {
    /// Create a new HTTP zone source using the system clock
    ///
    /// # Parameters
    ///
    /// - `config`: endpoint URL and request timeout
    /// - `directory`: mapping used to name the fetched identifiers
    pub fn new(config: &SourceConfig, directory: Arc<ZoneDirectory>) -> Result<Self> {
        Self::with_clock(config, directory, Arc::new(SystemClock))
    }

    /// Create with a custom clock
    pub fn with_clock(
        config: &SourceConfig,
        directory: Arc<ZoneDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: config.url.clone(),
            directory,
            clock,
            client,
        })
    }

    async fn fetch_response(&self) -> Result<ZoneResponse> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::fetch(format!("Request failed: {}", e)))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(Error::fetch(format!("HTTP error: {}", response.status())));
        }

        response
            .json::<ZoneResponse>()
            .await
            .map_err(|e| Error::fetch(format!("Malformed response: {}", e)))
    }

    fn record(&self, ids: &[ZoneId], role: ZoneRole, at: DateTime<Utc>) -> Result<ZoneRecord> {
        let entry = self.directory.resolve_or_fallback(ids).ok_or_else(|| {
            Error::invalid_response(format!("Empty identifier list for {:?} zone", role))
        })?;

        Ok(ZoneRecord::new(entry.location, entry.image, role, at))
    }
}

/// Rotation boundary reported by upstream at `now`
fn boundary(now: DateTime<Utc>, duration: Option<f64>) -> DateTime<Utc> {
    hour_round(now + minutes(duration))
}

/// Minutes as reported upstream, clamped to something a timestamp can hold
fn minutes(duration: Option<f64>) -> TimeDelta {
    let minutes = duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0);
    let millis = Duration::try_from_secs_f64(minutes * 60.0)
        .unwrap_or_default()
        .as_millis();
    TimeDelta::try_milliseconds(i64::try_from(millis).unwrap_or(i64::MAX))
        .unwrap_or(TimeDelta::zero())
}

#[async_trait::async_trait]
impl ZoneSource for HttpZoneSource {
    async fn fetch(&self) -> Result<ZonePair> {
        let body = self.fetch_response().await?;
        let next_at = boundary(self.clock.now(), body.duration);
        let current_at = next_at - TimeDelta::hours(1);

        let current = self.record(&body.current, ZoneRole::Current, current_at)?;
        let next = self.record(&body.next, ZoneRole::Next, next_at)?;

        tracing::debug!(
            "Fetched terror zones: now {} / next {} (duration {:?})",
            current.name,
            next.name,
            body.duration
        );

        Ok(ZonePair::new(current, next))
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
