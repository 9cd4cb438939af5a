//! Configuration types for the terror zone notifier
//!
//! This module defines the configuration structures shared by the daemon and
//! embedders. Sink configuration lives in [`crate::sinks`], zone mappings in
//! [`crate::directory`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upstream zone API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the terror zone endpoint
    pub url: String,

    /// Per-request timeout (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl SourceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_http_timeout_secs(),
        }
    }

    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("Zone API URL cannot be empty"));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Zone API URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be > 0"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// State store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based state store
    File {
        /// Path to the state file
        path: String,
    },

    /// In-memory state store (not persistent)
    Memory,
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        StateStoreConfig::File {
            path: default_state_path(),
        }
    }
}

/// Hourly check schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Minutes after the hour during which a check may start
    #[serde(default = "default_check_window_minutes")]
    pub check_window_minutes: u32,

    /// Delay after entering the check window before the first fetch (in seconds)
    ///
    /// Upstream data is unreliable right after the hour flips.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,

    /// Maximum fetch attempts per hour while upstream still shows the old state
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Delay between fetch attempts (in seconds)
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
}

impl ScheduleConfig {
    /// Validate the schedule
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.check_window_minutes == 0 || self.check_window_minutes > 59 {
            return Err(crate::Error::config(format!(
                "Check window must be between 1 and 59 minutes. Got: {}",
                self.check_window_minutes
            )));
        }
        if self.max_attempts == 0 {
            return Err(crate::Error::config("Max attempts must be > 0"));
        }
        if self.retry_interval_secs == 0 {
            return Err(crate::Error::config("Retry interval must be > 0"));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            check_window_minutes: default_check_window_minutes(),
            settle_delay_secs: default_settle_delay_secs(),
            max_attempts: default_max_attempts(),
            retry_interval_secs: default_retry_interval_secs(),
        }
    }
}

/// Footer text of the attribution embed
pub fn default_footer() -> String {
    "TZone-BOT".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_state_path() -> String {
    "state.json".to_string()
}

fn default_check_window_minutes() -> u32 {
    5
}

fn default_settle_delay_secs() -> u64 {
    180
}

fn default_max_attempts() -> usize {
    5
}

fn default_retry_interval_secs() -> u64 {
    60
}
