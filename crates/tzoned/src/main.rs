// # tzoned - Terror Zone Notifier Daemon
//
// This daemon is a THIN integration layer:
// - DO NOT add scheduling, change detection or retry logic here
// - All of that lives in tzone-core
// - Configuration is via environment variables and the two JSON files only
//
// The tzoned daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Loading the zone directory and the webhook list
// 3. Wiring the HTTP source, Discord sink and state store into a ZoneWatcher
// 4. Serving the liveness page while the watcher runs
//
// ## Configuration
//
// ### Upstream
// - `TZONE_API_URL`: Terror zone API endpoint (required)
// - `TZONE_HTTP_TIMEOUT_SECS`: Request timeout for upstream and webhooks (default 30)
//
// ### Files
// - `TZONE_ZONES_PATH`: Zone directory JSON (default zones.json)
// - `TZONE_WEBHOOKS_PATH`: Webhook list JSON; when unset, `WEBHOOK1`, `WEBHOOK2`, ...
//   and `DEBUG_WEBHOOK` are read instead
//
// ### State Store
// - `TZONE_STATE_STORE`: Type of state store (file, memory)
// - `TZONE_STATE_PATH`: Path to state file (default state.json)
//
// ### Schedule
// - `TZONE_CHECK_WINDOW_MINUTES`: Minutes after the hour a check may start (default 5)
// - `TZONE_SETTLE_DELAY_SECS`: Delay before the first fetch (default 180)
// - `TZONE_MAX_ATTEMPTS`: Fetch attempts while upstream is unchanged (default 5)
// - `TZONE_RETRY_INTERVAL_SECS`: Delay between attempts (default 60)
//
// ### Misc
// - `TZONE_BIND_ADDR`: Liveness page address (default 0.0.0.0:8080)
// - `TZONE_FOOTER`: Attribution embed text
// - `TZONE_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export TZONE_API_URL=https://api.d2tz.info/terror_zone
// export TZONE_ZONES_PATH=/etc/tzone/zones.json
// export WEBHOOK1=https://discord.com/api/webhooks/...
// export TZONE_STATE_PATH=/var/lib/tzone/state.json
//
// tzoned
// ```

mod config;
mod status;

use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use tzone_core::{Notifier, SinkConfig, SystemClock, WatcherEvent, ZoneDirectory, ZoneWatcher};
use tzone_notifier_discord::DiscordWebhookSink;
use tzone_source_http::HttpZoneSource;

use crate::config::Config;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// How long the watcher and server get to stop after a signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum TzoneExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<TzoneExitCode> for ExitCode {
    fn from(code: TzoneExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return TzoneExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return TzoneExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return TzoneExitCode::ConfigError.into();
    }

    info!("Starting tzoned daemon");

    let (directory, sinks) = match load_inputs(&config) {
        Ok(inputs) => inputs,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return TzoneExitCode::ConfigError.into();
        }
    };

    info!(
        "Configuration loaded: {} zone(s), {} webhook(s), debug webhook {}",
        directory.len(),
        sinks.webhooks.len(),
        if sinks.debug_webhook.is_some() { "enabled" } else { "disabled" }
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return TzoneExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config, directory, sinks).await {
            error!("Daemon error: {:#}", e);
            TzoneExitCode::RuntimeError
        } else {
            TzoneExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Load the zone directory and webhook list named by the configuration
fn load_inputs(config: &Config) -> Result<(ZoneDirectory, SinkConfig)> {
    let directory = ZoneDirectory::from_file(&config.zones_path)?;
    if directory.is_empty() {
        warn!("Zone directory is empty; every zone will use its fallback name");
    }

    let sinks = match &config.webhooks_path {
        Some(path) => SinkConfig::from_file(path)?,
        None => SinkConfig::from_env(),
    };
    sinks
        .validate()
        .context("Set TZONE_WEBHOOKS_PATH or WEBHOOK1, WEBHOOK2, ...")?;

    Ok((directory, sinks))
}

/// Run the daemon
async fn run_daemon(config: Config, directory: ZoneDirectory, sinks: SinkConfig) -> Result<()> {
    let state_store = tzone_core::state::from_config(&config.state_store).await?;
    let source = HttpZoneSource::new(&config.source, Arc::new(directory))?;
    let sink = DiscordWebhookSink::with_timeout(config.source.timeout())?;
    let notifier = Notifier::new(Box::new(sink), sinks, config.footer);

    let (mut watcher, events) = ZoneWatcher::new(
        Box::new(source),
        notifier,
        state_store,
        config.schedule,
        Arc::new(SystemClock),
    )?;
    let status_rx = watcher.status();

    tokio::spawn(log_events(events));

    let (watcher_stop_tx, watcher_stop_rx) = oneshot::channel();
    let watcher_handle =
        tokio::spawn(async move { watcher.run_with_shutdown(Some(watcher_stop_rx)).await });

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Status page listening on {}", config.bind_addr);

    let (server_stop_tx, server_stop_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, status::router(status_rx)).with_graceful_shutdown(
        async move {
            let _ = server_stop_rx.await;
        },
    );
    let mut server_handle = tokio::spawn(async move { server.await });

    tokio::select! {
        signal = wait_for_shutdown() => {
            let signal = signal?;
            info!("Received shutdown signal: {}", signal);
        }
        result = &mut server_handle => {
            result.context("Status server task panicked")??;
            anyhow::bail!("Status server stopped unexpectedly");
        }
    }

    info!("Shutting down daemon");
    let _ = watcher_stop_tx.send(());
    let _ = server_stop_tx.send(());

    let stopped = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let watcher_result = watcher_handle.await.context("Watcher task panicked")?;
        let server_result = server_handle.await.context("Status server task panicked")?;
        watcher_result?;
        server_result?;
        anyhow::Ok(())
    })
    .await;

    match stopped {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "Shutdown timeout after {:?}",
            SHUTDOWN_TIMEOUT
        )),
    }
}

/// Drain watcher events into the log
async fn log_events(mut events: mpsc::Receiver<WatcherEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            WatcherEvent::GaveUp { attempts } => {
                warn!("Upstream unchanged after {} attempt(s)", attempts)
            }
            WatcherEvent::Stopped { reason } => info!("Watcher stopped: {}", reason),
            other => debug!("Watcher event: {:?}", other),
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
