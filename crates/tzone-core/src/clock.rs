//! Wall-clock access
//!
//! The watcher schedules against minute-of-hour, so every time lookup goes
//! through [`Clock`] instead of calling `Utc::now()` directly.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use std::time::Duration;

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock that advances with tokio's timer
///
/// Anchored at a fixed wall time when created. Under `tokio::time::pause()`
/// it only moves when the runtime auto-advances or `tokio::time::advance` is
/// called, which makes hour-boundary scheduling deterministic.
#[derive(Debug, Clone)]
pub struct TokioClock {
    anchor: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl TokioClock {
    pub fn starting_at(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = tokio::time::Instant::now().duration_since(self.started);
        self.anchor + TimeDelta::from_std(elapsed).unwrap_or(TimeDelta::zero())
    }
}

/// Start of the hour containing `t`
pub fn hour_floor(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(TimeDelta::hours(1)).unwrap_or(t)
}

/// Hour boundary nearest to `t`; half past rounds up
pub fn hour_round(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_round(TimeDelta::hours(1)).unwrap_or(t)
}

/// Time left until the next hour boundary (never zero)
pub fn until_next_hour(t: DateTime<Utc>) -> Duration {
    let next = hour_floor(t) + TimeDelta::hours(1);
    (next - t).to_std().unwrap_or(Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_hour_floor() {
        let t = Utc.with_ymd_and_hms(2026, 3, 4, 10, 37, 12).unwrap();
        let floored = hour_floor(t);
        assert_eq!(floored.hour(), 10);
        assert_eq!(floored.minute(), 0);
        assert_eq!(floored.second(), 0);
    }

    #[test]
    fn test_hour_round() {
        let ten = Utc.with_ymd_and_hms(2026, 3, 4, 10, 0, 0).unwrap();
        let eleven = Utc.with_ymd_and_hms(2026, 3, 4, 11, 0, 0).unwrap();

        assert_eq!(hour_round(ten + TimeDelta::minutes(3)), ten);
        assert_eq!(hour_round(ten - TimeDelta::seconds(20)), ten);
        assert_eq!(hour_round(ten + TimeDelta::minutes(30)), eleven);
        assert_eq!(hour_round(eleven), eleven);
    }

    #[test]
    fn test_until_next_hour() {
        let t = Utc.with_ymd_and_hms(2026, 3, 4, 10, 59, 30).unwrap();
        assert_eq!(until_next_hour(t), Duration::from_secs(30));

        let on_boundary = Utc.with_ymd_and_hms(2026, 3, 4, 10, 0, 0).unwrap();
        assert_eq!(until_next_hour(on_boundary), Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let anchor = Utc.with_ymd_and_hms(2026, 3, 4, 10, 0, 0).unwrap();
        let clock = TokioClock::starting_at(anchor);

        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(clock.now(), anchor + TimeDelta::seconds(90));
    }
}
