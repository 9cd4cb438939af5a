//! Test doubles and common utilities for scheduling contract tests
//!
//! All doubles share their counters through `Arc`, so a test can keep a
//! handle while the watcher owns the boxed copy.

#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tzone_core::clock::TokioClock;
use tzone_core::error::{Error, Result};
use tzone_core::traits::{StateStore, WebhookSink, ZoneSource};
use tzone_core::{
    NotificationPayload, Notifier, ScheduleConfig, SinkConfig, StateSnapshot, WatcherEvent,
    ZonePair, ZoneRecord, ZoneRole, ZoneWatcher,
};

/// Wall time on the test day
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, hour, minute, 0).unwrap()
}

/// Zone pair as upstream reports it during `hour`
pub fn pair_at(current: &str, next: &str, hour: u32) -> ZonePair {
    let start = at(hour, 0);
    ZonePair::new(
        ZoneRecord::new(
            current,
            format!("https://img.test/{}", current),
            ZoneRole::Current,
            start,
        ),
        ZoneRecord::new(
            next,
            format!("https://img.test/{}", next),
            ZoneRole::Next,
            start + TimeDelta::hours(1),
        ),
    )
}

/// A ZoneSource that replays a script of fetch results
///
/// `None` entries fail. The last entry repeats once the script runs out.
#[derive(Clone)]
pub struct ScriptedZoneSource {
    script: Arc<Vec<Option<ZonePair>>>,
    fetch_count: Arc<AtomicUsize>,
}

impl ScriptedZoneSource {
    pub fn new(script: Vec<Option<ZonePair>>) -> Self {
        assert!(!script.is_empty(), "script needs at least one entry");
        Self {
            script: Arc::new(script),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source that always reports `pair`
    pub fn fixed(pair: ZonePair) -> Self {
        Self::new(vec![Some(pair)])
    }

    /// Get the number of times fetch() was called
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ZoneSource for ScriptedZoneSource {
    async fn fetch(&self) -> Result<ZonePair> {
        let n = self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let step = self.script.get(n).or(self.script.last()).cloned().flatten();
        step.ok_or_else(|| Error::fetch("scripted failure"))
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A WebhookSink that records deliveries and fails for selected URLs
#[derive(Clone, Default)]
pub struct RecordingSink {
    posted: Arc<Mutex<Vec<(String, NotificationPayload)>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make deliveries to `url` fail (or succeed again)
    pub fn set_failing(&self, url: &str, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(url.to_string());
        } else {
            set.remove(url);
        }
    }

    /// URLs posted to, in order
    pub fn posted_urls(&self) -> Vec<String> {
        self.posted.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    /// Number of posts to `url`
    pub fn post_count(&self, url: &str) -> usize {
        self.posted.lock().unwrap().iter().filter(|(u, _)| u == url).count()
    }

    /// Last payload posted to `url`
    pub fn last_payload(&self, url: &str) -> Option<NotificationPayload> {
        self.posted
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(u, _)| u == url)
            .map(|(_, p)| p.clone())
    }
}

#[async_trait::async_trait]
impl WebhookSink for RecordingSink {
    async fn post(&self, url: &str, payload: &NotificationPayload) -> Result<()> {
        self.posted
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));

        if self.failing.lock().unwrap().contains(url) {
            Err(Error::notify("recording", "status 500"))
        } else {
            Ok(())
        }
    }

    fn sink_name(&self) -> &'static str {
        "recording"
    }
}

/// A StateStore that tracks calls
#[derive(Clone, Default)]
pub struct CountingStateStore {
    snapshot: Arc<Mutex<Option<StateSnapshot>>>,
    load_count: Arc<AtomicUsize>,
    save_count: Arc<AtomicUsize>,
}

impl CountingStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StateSnapshot) -> Self {
        let store = Self::default();
        *store.snapshot.lock().unwrap() = Some(snapshot);
        store
    }

    /// Get the number of times save() was called
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Get the number of times load() was called
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Option<StateSnapshot> {
        self.snapshot.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl StateStore for CountingStateStore {
    async fn load(&self) -> Result<Option<StateSnapshot>> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn save(&self, snapshot: &StateSnapshot) -> Result<()> {
        self.save_count.fetch_add(1, Ordering::SeqCst);
        *self.snapshot.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }
}

/// Doubles wired into one watcher
pub struct Harness {
    pub watcher: ZoneWatcher,
    pub events: mpsc::Receiver<WatcherEvent>,
    pub source: ScriptedZoneSource,
    pub sink: RecordingSink,
    pub store: CountingStateStore,
}

/// Build a watcher with default schedule whose clock starts at `start`
pub fn harness(
    source: ScriptedZoneSource,
    store: CountingStateStore,
    sinks: SinkConfig,
    start: DateTime<Utc>,
) -> Harness {
    let sink = RecordingSink::new();
    let notifier = Notifier::new(Box::new(sink.clone()), sinks, "test footer");

    let (watcher, events) = ZoneWatcher::new(
        Box::new(source.clone()),
        notifier,
        Box::new(store.clone()),
        ScheduleConfig::default(),
        Arc::new(TokioClock::starting_at(start)),
    )
    .expect("watcher construction succeeds");

    Harness {
        watcher,
        events,
        source,
        sink,
        store,
    }
}

/// A sink configuration with the given webhooks and no debug webhook
pub fn webhooks(urls: &[&str]) -> SinkConfig {
    SinkConfig::new(urls.iter().map(|u| u.to_string()).collect(), None)
}

/// Drain every event currently queued
pub fn drain(events: &mut mpsc::Receiver<WatcherEvent>) -> Vec<WatcherEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}
