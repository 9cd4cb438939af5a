//! Retry-until-changed state machine
//!
//! Right after the hour flips, upstream may still report the previous hour's
//! zones. The watcher keeps fetching, with a fixed interval, while the fetched
//! snapshot equals the last announced one:
//!
//! ```text
//!             unchanged, attempt < max
//!            ┌───────────────────────┐
//!            ▼                       │
//!   ──▶ Probing{attempt} ────────────┘
//!            │        │         │
//!     changed│  fetch │ error   │ unchanged, attempt == max
//!            ▼        ▼         ▼
//!        Changed   Aborted   Exhausted
//! ```

use std::time::Duration;

use crate::config::ScheduleConfig;
use crate::error::{Error, Result};
use crate::model::{StateSnapshot, ZonePair};

/// Attempt bound and fixed spacing of the probe loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub interval: Duration,
}

impl From<&ScheduleConfig> for RetryPolicy {
    fn from(schedule: &ScheduleConfig) -> Self {
        Self {
            max_attempts: schedule.max_attempts,
            interval: schedule.retry_interval(),
        }
    }
}

/// State of one hour's probe loop
#[derive(Debug)]
pub enum RetryState {
    /// About to perform fetch number `attempt` (1-based)
    Probing { attempt: usize },
    /// Upstream differs from the last announcement
    Changed(ZonePair),
    /// Upstream never changed within the attempt bound
    Exhausted { attempts: usize },
    /// A fetch failed; the cycle is abandoned
    Aborted(Error),
}

impl RetryState {
    pub fn start() -> Self {
        RetryState::Probing { attempt: 1 }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryState::Probing { .. })
    }

    /// Feed the outcome of the fetch made in `Probing` state
    ///
    /// Terminal states ignore further input.
    pub fn advance(
        self,
        fetched: Result<ZonePair>,
        last: Option<&StateSnapshot>,
        policy: &RetryPolicy,
    ) -> Self {
        let RetryState::Probing { attempt } = self else {
            return self;
        };

        match fetched {
            Err(e) => RetryState::Aborted(e),
            Ok(pair) if last != Some(&pair.snapshot()) => RetryState::Changed(pair),
            Ok(_) if attempt >= policy.max_attempts => RetryState::Exhausted { attempts: attempt },
            Ok(_) => RetryState::Probing {
                attempt: attempt + 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ZoneRecord, ZoneRole};
    use chrono::Utc;

    fn pair(current: &str) -> ZonePair {
        let now = Utc::now();
        ZonePair::new(
            ZoneRecord::new(current, "", ZoneRole::Current, now),
            ZoneRecord::new("Jail", "", ZoneRole::Next, now),
        )
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            interval: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_change_detected_on_first_probe() {
        let old = pair("Oasis");
        let state = RetryState::start().advance(Ok(pair("Tristram")), Some(&old.snapshot()), &policy());
        assert!(matches!(state, RetryState::Changed(p) if p.current.name == "Tristram"));
    }

    #[test]
    fn test_no_prior_state_counts_as_change() {
        let state = RetryState::start().advance(Ok(pair("Oasis")), None, &policy());
        assert!(matches!(state, RetryState::Changed(_)));
    }

    #[test]
    fn test_unchanged_probes_until_bound() {
        let same = pair("Oasis");
        let last = same.snapshot();
        let mut state = RetryState::start();
        let mut fetches = 0;

        while !state.is_terminal() {
            fetches += 1;
            state = state.advance(Ok(same.clone()), Some(&last), &policy());
        }

        assert_eq!(fetches, 5);
        assert!(matches!(state, RetryState::Exhausted { attempts: 5 }));
    }

    #[test]
    fn test_fetch_error_aborts() {
        let state = RetryState::Probing { attempt: 3 }.advance(
            Err(Error::fetch("status 503")),
            None,
            &policy(),
        );
        assert!(matches!(state, RetryState::Aborted(Error::Fetch(_))));
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let state = RetryState::Exhausted { attempts: 5 }.advance(Ok(pair("Oasis")), None, &policy());
        assert!(matches!(state, RetryState::Exhausted { attempts: 5 }));
    }
}
