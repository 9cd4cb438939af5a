//! Hourly change detector and notification scheduler
//!
//! The ZoneWatcher is responsible for:
//! - Waking up at the top of every hour
//! - Fetching the current/next zones once upstream has settled
//! - Comparing them against the last announced snapshot
//! - Announcing changes to every webhook
//! - Persisting the snapshot after a successful announcement
//!
//! ## Schedule
//!
//! ```text
//!  :00          :03                                   :59
//!   │  settle    │ probe ─ 60s ─ probe ─ ... (≤ 5)     │
//!   ├────────────┼─────────────────────────────────────┤
//!   │◀── check window (minute < 5) ──▶│                │
//!                                     └─ idle until next hour
//! ```
//!
//! ## Announced-hour policy
//!
//! An hour counts as announced only after every webhook accepted the
//! notification. Fetch failures, retry exhaustion and delivery failures leave
//! the hour open, so a new check starts if the window is still open;
//! otherwise the next hour is the next chance. The flag resets implicitly
//! because it records *which* hour was announced.

pub mod retry;

use chrono::{DateTime, Timelike, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

pub use retry::{RetryPolicy, RetryState};

use crate::clock::{Clock, hour_floor, until_next_hour};
use crate::config::ScheduleConfig;
use crate::error::Result;
use crate::model::{StateSnapshot, ZonePair, ZoneRecord};
use crate::notifier::{Notifier, NotifyTarget};
use crate::traits::{StateStore, ZoneSource};

/// Capacity of the watcher event channel
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Events emitted by the ZoneWatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherEvent {
    /// Watcher started
    Started {
        /// Whether a persisted snapshot was restored
        restored: bool,
    },

    /// Check phase entered for an hour
    CheckStarted { hour: DateTime<Utc> },

    /// A fetch completed
    Fetched { attempt: usize, changed: bool },

    /// A fetch failed and the check was abandoned
    FetchFailed { attempt: usize, error: String },

    /// Upstream never changed within the attempt bound
    GaveUp { attempts: usize },

    /// All webhooks accepted the announcement
    Announced { current: String, next: String },

    /// At least one webhook rejected the announcement
    NotifyFailed { error: Option<String> },

    /// Snapshot could not be written after a successful announcement
    PersistFailed { error: String },

    /// Idle until the next hour
    Settling { wake_at: DateTime<Utc> },

    /// Watcher stopped
    Stopped { reason: String },
}

/// How a check phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Announced,
    Unchanged,
    FetchFailed,
    NotifyFailed,
}

/// Scheduler phase derived from the wall clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Inside the check window and the hour is not yet announced
    Check,
    /// Idle until the next hour boundary
    Settle,
}

/// Last announced zones, for read-only display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneStatus {
    pub current: ZoneRecord,
    pub next: ZoneRecord,
    /// When this process announced it; `None` when restored from disk
    pub announced_at: Option<DateTime<Utc>>,
}

/// Hourly terror zone watcher
///
/// ## Lifecycle
///
/// 1. Create with [`ZoneWatcher::new()`]
/// 2. Hand out [`ZoneWatcher::status()`] receivers to readers
/// 3. Spawn [`ZoneWatcher::run()`] on its own task
///
/// ## Threading
///
/// All decisions happen on the single task running the watcher. Readers see
/// the last announcement through a `watch` channel and never block it.
pub struct ZoneWatcher {
    source: Box<dyn ZoneSource>,
    notifier: Notifier,
    state_store: Box<dyn StateStore>,
    schedule: ScheduleConfig,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,

    /// Last successfully announced snapshot (`None` until restored or announced)
    last_snapshot: Option<StateSnapshot>,
    restored: bool,

    /// Start of the hour that was last announced
    announced_hour: Option<DateTime<Utc>>,

    status_tx: watch::Sender<Option<ZoneStatus>>,
    event_tx: mpsc::Sender<WatcherEvent>,
}

impl ZoneWatcher {
    /// Create a new watcher
    ///
    /// # Returns
    ///
    /// A tuple of (watcher, event_receiver) where event_receiver yields watcher events
    pub fn new(
        source: Box<dyn ZoneSource>,
        notifier: Notifier,
        state_store: Box<dyn StateStore>,
        schedule: ScheduleConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, mpsc::Receiver<WatcherEvent>)> {
        schedule.validate()?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (status_tx, _) = watch::channel(None);

        let watcher = Self {
            source,
            notifier,
            state_store,
            policy: RetryPolicy::from(&schedule),
            schedule,
            clock,
            last_snapshot: None,
            restored: false,
            announced_hour: None,
            status_tx,
            event_tx,
        };

        Ok((watcher, event_rx))
    }

    /// Subscribe to the last announced zones
    pub fn status(&self) -> watch::Receiver<Option<ZoneStatus>> {
        self.status_tx.subscribe()
    }

    /// The snapshot change detection compares against
    pub fn last_snapshot(&self) -> Option<&StateSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Run until Ctrl-C
    pub async fn run(&mut self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run until `shutdown_rx` fires (or Ctrl-C when `None`)
    pub async fn run_with_shutdown(
        &mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&mut self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.restore_state().await;
        self.emit_event(WatcherEvent::Started {
            restored: self.last_snapshot.is_some(),
        });

        // Sleeps are not interruptible on their own; shutdown drops the loop.
        if let Some(rx) = shutdown_rx {
            tokio::select! {
                _ = self.watch_loop() => {}
                _ = rx => info!("Shutdown signal received"),
            }
        } else {
            tokio::select! {
                _ = self.watch_loop() => {}
                _ = tokio::signal::ctrl_c() => info!("Shutdown signal received"),
            }
        }

        self.emit_event(WatcherEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
        info!("Zone watcher stopped");
        Ok(())
    }

    async fn watch_loop(&mut self) {
        loop {
            let now = self.clock.now();
            match self.phase(now) {
                Phase::Check => {
                    let outcome = self.run_check_phase().await;
                    if outcome != CheckOutcome::Announced {
                        // Keep a failing window from spinning
                        tokio::time::sleep(self.policy.interval).await;
                    }
                }
                Phase::Settle => {
                    let wait = until_next_hour(now);
                    let wake_at = hour_floor(now) + chrono::TimeDelta::hours(1);
                    debug!("Waiting for the top of the hour ({}s)", wait.as_secs());
                    self.emit_event(WatcherEvent::Settling { wake_at });
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Which phase the watcher is in at `now`
    pub fn phase(&self, now: DateTime<Utc>) -> Phase {
        let in_window = now.minute() < self.schedule.check_window_minutes;
        let announced = self.announced_hour == Some(hour_floor(now));

        if in_window && !announced {
            Phase::Check
        } else {
            Phase::Settle
        }
    }

    /// Load the persisted snapshot once
    ///
    /// An unreadable store counts as "nothing announced yet".
    pub async fn restore_state(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;

        match self.state_store.load().await {
            Ok(Some(snapshot)) => {
                info!(
                    "Restored last announcement: {} / {}",
                    snapshot.current.name, snapshot.next.name
                );
                self.status_tx.send_replace(Some(ZoneStatus {
                    current: snapshot.current.clone(),
                    next: snapshot.next.clone(),
                    announced_at: None,
                }));
                self.last_snapshot = Some(snapshot);
            }
            Ok(None) => debug!("No persisted announcement"),
            Err(e) => warn!("Failed to load persisted state, starting empty: {}", e),
        }
    }

    /// Run one check phase for the current hour
    ///
    /// Waits the settle delay, probes upstream until it differs from the last
    /// announcement (bounded), then announces and persists.
    pub async fn run_check_phase(&mut self) -> CheckOutcome {
        self.restore_state().await;

        let hour = hour_floor(self.clock.now());
        info!("Checking terror zones for hour {}", hour.format("%Y-%m-%d %H:%M"));
        self.emit_event(WatcherEvent::CheckStarted { hour });

        tokio::time::sleep(self.schedule.settle_delay()).await;

        let pair = match self.probe_until_changed().await {
            RetryState::Changed(pair) => pair,
            RetryState::Exhausted { attempts } => {
                warn!(
                    "Upstream unchanged after {} attempt(s), giving up for now",
                    attempts
                );
                self.emit_event(WatcherEvent::GaveUp { attempts });
                return CheckOutcome::Unchanged;
            }
            RetryState::Aborted(e) if e.is_fetch() => {
                error!("Failed to fetch terror zones: {}", e);
                return CheckOutcome::FetchFailed;
            }
            RetryState::Aborted(e) => {
                error!("Terror zone check aborted: {}", e);
                return CheckOutcome::FetchFailed;
            }
            RetryState::Probing { attempt } => {
                warn!("Probe loop stopped early at attempt {}", attempt);
                return CheckOutcome::Unchanged;
            }
        };

        self.announce(hour, pair).await
    }

    async fn probe_until_changed(&mut self) -> RetryState {
        let mut state = RetryState::start();

        while let RetryState::Probing { attempt } = state {
            if attempt > 1 {
                tokio::time::sleep(self.policy.interval).await;
            }

            let fetched = self.source.fetch().await;
            match &fetched {
                Ok(pair) => {
                    self.notifier.preview(pair).await;
                    let changed = self.last_snapshot.as_ref() != Some(&pair.snapshot());
                    debug!(
                        "Fetch attempt {} from {}: {} / {} (changed: {})",
                        attempt,
                        self.source.source_name(),
                        pair.current.name,
                        pair.next.name,
                        changed
                    );
                    self.emit_event(WatcherEvent::Fetched { attempt, changed });
                }
                Err(e) => {
                    self.emit_event(WatcherEvent::FetchFailed {
                        attempt,
                        error: e.to_string(),
                    });
                }
            }

            state = state.advance(fetched, self.last_snapshot.as_ref(), &self.policy);
        }

        state
    }

    async fn announce(&mut self, hour: DateTime<Utc>, pair: ZonePair) -> CheckOutcome {
        let delivered = self
            .notifier
            .notify(&pair.current, &pair.next, NotifyTarget::AllSinks)
            .await;

        match delivered {
            Ok(true) => {}
            Ok(false) => {
                error!("Failed to send announcement to every webhook");
                self.emit_event(WatcherEvent::NotifyFailed { error: None });
                return CheckOutcome::NotifyFailed;
            }
            Err(e) => {
                error!("Failed to send announcement: {}", e);
                self.emit_event(WatcherEvent::NotifyFailed {
                    error: Some(e.to_string()),
                });
                return CheckOutcome::NotifyFailed;
            }
        }

        let snapshot = pair.snapshot();
        if let Err(e) = self.state_store.save(&snapshot).await {
            warn!("Failed to persist announcement: {}", e);
            self.emit_event(WatcherEvent::PersistFailed {
                error: e.to_string(),
            });
        }

        info!(
            "Announced terror zones: now {} / next {}",
            pair.current.name, pair.next.name
        );
        self.emit_event(WatcherEvent::Announced {
            current: pair.current.name.clone(),
            next: pair.next.name.clone(),
        });

        self.last_snapshot = Some(snapshot);
        self.announced_hour = Some(hour);
        self.status_tx.send_replace(Some(ZoneStatus {
            current: pair.current,
            next: pair.next,
            announced_at: Some(self.clock.now()),
        }));

        CheckOutcome::Announced
    }

    fn emit_event(&self, event: WatcherEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping watcher event");
        }
    }
}
