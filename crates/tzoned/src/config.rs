//! Daemon configuration from environment variables

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use tzone_core::config::{ScheduleConfig, SourceConfig, StateStoreConfig, default_footer};

const DEFAULT_ZONES_PATH: &str = "zones.json";
const DEFAULT_STATE_PATH: &str = "state.json";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Application configuration
#[derive(Debug)]
pub struct Config {
    pub source: SourceConfig,
    pub zones_path: String,
    pub webhooks_path: Option<String>,
    pub state_store: StateStoreConfig,
    pub bind_addr: SocketAddr,
    pub schedule: ScheduleConfig,
    pub footer: String,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_url = var("TZONE_API_URL").context(
            "TZONE_API_URL is required. \
            Set it via: export TZONE_API_URL=https://api.d2tz.info/terror_zone",
        )?;

        let mut source = SourceConfig::new(api_url);
        if let Some(timeout) = parse_var(&var, "TZONE_HTTP_TIMEOUT_SECS")? {
            source.timeout_secs = timeout;
        }

        let state_store = match var("TZONE_STATE_STORE").as_deref().unwrap_or("file") {
            "file" => StateStoreConfig::File {
                path: var("TZONE_STATE_PATH").unwrap_or_else(|| DEFAULT_STATE_PATH.to_string()),
            },
            "memory" => StateStoreConfig::Memory,
            other => anyhow::bail!(
                "TZONE_STATE_STORE '{}' is not supported. \
                Supported types: file, memory",
                other
            ),
        };

        let bind_addr = var("TZONE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse().with_context(|| {
            format!(
                "TZONE_BIND_ADDR must be an address like 0.0.0.0:8080. Got: {}",
                bind_addr
            )
        })?;

        let mut schedule = ScheduleConfig::default();
        if let Some(window) = parse_var(&var, "TZONE_CHECK_WINDOW_MINUTES")? {
            schedule.check_window_minutes = window;
        }
        if let Some(delay) = parse_var(&var, "TZONE_SETTLE_DELAY_SECS")? {
            schedule.settle_delay_secs = delay;
        }
        if let Some(attempts) = parse_var(&var, "TZONE_MAX_ATTEMPTS")? {
            schedule.max_attempts = attempts;
        }
        if let Some(interval) = parse_var(&var, "TZONE_RETRY_INTERVAL_SECS")? {
            schedule.retry_interval_secs = interval;
        }

        Ok(Self {
            source,
            zones_path: var("TZONE_ZONES_PATH").unwrap_or_else(|| DEFAULT_ZONES_PATH.to_string()),
            webhooks_path: var("TZONE_WEBHOOKS_PATH"),
            state_store,
            bind_addr,
            schedule,
            footer: var("TZONE_FOOTER").unwrap_or_else(default_footer),
            log_level: var("TZONE_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Files named by the configuration must exist; their content is checked
    /// when loaded.
    pub fn validate(&self) -> Result<()> {
        self.source
            .validate()
            .context("TZONE_API_URL or TZONE_HTTP_TIMEOUT_SECS is invalid")?;

        if self.source.url.starts_with("http://") {
            eprintln!(
                "WARNING: TZONE_API_URL uses HTTP (not HTTPS). \
                Consider using HTTPS."
            );
        }

        self.schedule.validate().context(
            "TZONE_CHECK_WINDOW_MINUTES, TZONE_MAX_ATTEMPTS or TZONE_RETRY_INTERVAL_SECS is invalid",
        )?;

        if self.schedule.settle_delay_secs >= 3600 {
            anyhow::bail!(
                "TZONE_SETTLE_DELAY_SECS must be below 3600 seconds. Got: {}",
                self.schedule.settle_delay_secs
            );
        }

        if !Path::new(&self.zones_path).is_file() {
            anyhow::bail!(
                "TZONE_ZONES_PATH does not point to a file: {}",
                self.zones_path
            );
        }

        if let Some(path) = &self.webhooks_path
            && !Path::new(path).is_file()
        {
            anyhow::bail!("TZONE_WEBHOOKS_PATH does not point to a file: {}", path);
        }

        if let StateStoreConfig::File { path } = &self.state_store
            && path.is_empty()
        {
            anyhow::bail!("TZONE_STATE_PATH cannot be empty when TZONE_STATE_STORE=file");
        }

        if self.footer.trim().is_empty() {
            anyhow::bail!("TZONE_FOOTER cannot be blank");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "TZONE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Parse an optional numeric variable, rejecting malformed values
fn parse_var<T, F>(var: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer. Got: {}", name, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("TZONE_API_URL", "https://api.test/tz")]).unwrap();

        assert_eq!(cfg.source.url, "https://api.test/tz");
        assert_eq!(cfg.source.timeout_secs, 30);
        assert_eq!(cfg.zones_path, "zones.json");
        assert_eq!(cfg.webhooks_path, None);
        assert!(matches!(
            cfg.state_store,
            StateStoreConfig::File { ref path } if path == "state.json"
        ));
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.schedule, ScheduleConfig::default());
        assert_eq!(cfg.footer, "TZone-BOT");
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_missing_api_url() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("TZONE_API_URL"));
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("TZONE_API_URL", "https://api.test/tz"),
            ("TZONE_STATE_STORE", "memory"),
            ("TZONE_BIND_ADDR", "127.0.0.1:9000"),
            ("TZONE_MAX_ATTEMPTS", "3"),
            ("TZONE_RETRY_INTERVAL_SECS", "30"),
            ("TZONE_SETTLE_DELAY_SECS", "0"),
            ("TZONE_FOOTER", "Custom footer"),
        ])
        .unwrap();

        assert!(matches!(cfg.state_store, StateStoreConfig::Memory));
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.schedule.max_attempts, 3);
        assert_eq!(cfg.schedule.retry_interval_secs, 30);
        assert_eq!(cfg.schedule.settle_delay_secs, 0);
        assert_eq!(cfg.footer, "Custom footer");
    }

    #[test]
    fn test_malformed_number_rejected() {
        let err = config(&[
            ("TZONE_API_URL", "https://api.test/tz"),
            ("TZONE_MAX_ATTEMPTS", "five"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("TZONE_MAX_ATTEMPTS"));
    }

    #[test]
    fn test_unknown_store_rejected() {
        let err = config(&[
            ("TZONE_API_URL", "https://api.test/tz"),
            ("TZONE_STATE_STORE", "redis"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("redis"));
    }

    #[test]
    fn test_validate_rejects_missing_zone_file() {
        let cfg = config(&[
            ("TZONE_API_URL", "https://api.test/tz"),
            ("TZONE_ZONES_PATH", "/nonexistent/zones.json"),
        ])
        .unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut cfg = config(&[("TZONE_API_URL", "https://api.test/tz")]).unwrap();
        cfg.zones_path = "Cargo.toml".to_string();
        assert!(cfg.validate().is_ok());

        cfg.log_level = "loud".to_string();
        assert!(cfg.validate().is_err());
    }
}
