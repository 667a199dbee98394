//! Heartbeat Monitor
//!
//! Run once per schedule tick (cron, systemd timer, ...). Exits non-zero when
//! the heartbeat could not be fetched or the state files could not be used.
//!
//! Environment variables (a `.env` file is read too):
//! - APP_URL: Base URL of the monitored API (required)
//! - SETTINGS_ENDPOINT / OAUTH_ENDPOINT: API paths (default: /settings, /oauth/token)
//! - OAUTH_CLIENT_ID: Client id for the guest token (default: store-front)
//! - STORE_FRONT_CLIENT_SECRET: Client secret for the guest token
//! - OAUTH_SCOPE: Scope requested with the guest token (default: store-front-guest)
//! - HTTP_TIMEOUT_SECS: Timeout for API and webhook requests (default: 30)
//! - TIMESTAMP_FILE: Heartbeat state file (default: .heartbeat)
//! - STATUS_FILE: Status file (default: TIMESTAMP_FILE + .last-status)
//! - PROPERTIES_FILE: Throttle file (default: .properties)
//! - LOCK_FILE: Lock file preventing overlapping runs (default: none)
//! - SLACK_WEBHOOK_URL, SLACK_USERNAME, SLACK_EMOJI_BEATING, SLACK_EMOJI_STOPPED
//! - SLACK_BROADCAST: Prefix alerts with a channel-wide mention (default: true)
//! - COOLDOWN_MINUTES: Minutes between repeated alerts (default: 60)
//! - HEARTBEAT_LOG_FILE: Also append logs to this file
//! - RUST_LOG: Log level (default: info)

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use heartbeat_monitor::alerts::{Notifier, NotifyTarget};
use heartbeat_monitor::monitor::{run_once, RunContext};
use heartbeat_monitor::source::ApiSource;
use heartbeat_monitor::state::FileStateStore;
use heartbeat_monitor::MonitorConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = MonitorConfig::from_env();

    // Initialize logging
    init_logging(config.as_ref().ok().and_then(|c| c.log_file.as_deref()))?;

    let config = config.map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;

    tracing::debug!(
        api_url = %config.base_url,
        heartbeat_file = %config.heartbeat_file.display(),
        status_file = %config.status_file.display(),
        throttle_file = %config.throttle_file.display(),
        cooldown_minutes = config.cooldown_minutes,
        slack = config.slack.webhook_url.is_some(),
        "Heartbeat monitor configuration"
    );

    let source = ApiSource::new(&config)?;
    let notifier =
        Notifier::with_timeout(NotifyTarget::from_config(&config), config.http_timeout)?;
    let store = FileStateStore::new(
        &config.heartbeat_file,
        &config.status_file,
        &config.throttle_file,
    );

    let ctx = RunContext {
        config: &config,
        source: &source,
        notifier: &notifier,
        store: &store,
    };

    match run_once(&ctx, chrono::Utc::now()).await {
        Ok(report) => {
            tracing::info!(
                decision = %report.decision,
                heartbeat = %report.observed,
                notified = report.notified,
                "Heartbeat check complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Heartbeat check aborted");
            Err(e.into())
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heartbeat_monitor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}
