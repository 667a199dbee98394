//! A single monitor run: observe, evaluate, notify, persist

use chrono::{DateTime, Utc};

use super::{evaluate, should_notify, Decision};
use crate::alerts::{queue_message, NotificationChannel};
use crate::config::MonitorConfig;
use crate::source::{ObservationSource, SourceError};
use crate::state::{RunLock, StateError, StateStore};

/// Everything one run needs, passed explicitly
pub struct RunContext<'a> {
    pub config: &'a MonitorConfig,
    pub source: &'a dyn ObservationSource,
    pub notifier: &'a dyn NotificationChannel,
    pub store: &'a dyn StateStore,
}

/// What a completed run decided and did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub decision: Decision,
    pub observed: String,
    /// A notification was attempted
    pub notified: bool,
    /// Delivery failure of the attempted notification
    pub delivery_error: Option<String>,
}

/// Errors that abort a run before any state is written
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Observation failed: {0}")]
    Source(#[from] SourceError),

    #[error("State error: {0}")]
    State(#[from] StateError),
}

/// Run one read-evaluate-notify-persist cycle
///
/// A failed observation or state read returns before anything is written.
/// Writes go status, throttle, heartbeat. A failed notification is logged
/// and reported, and the new state is persisted regardless.
pub async fn run_once(ctx: &RunContext<'_>, now: DateTime<Utc>) -> Result<RunReport, MonitorError> {
    let api_url = ctx.config.base_url.as_str();

    let _lock = match &ctx.config.lock_file {
        Some(path) => Some(RunLock::acquire(path)?),
        None => None,
    };

    let observed = ctx.source.observe().await.map_err(|e| {
        tracing::error!(api_url, error = %e, "Heartbeat fetch failed, state left untouched");
        e
    })?;

    let previous = ctx.store.read_heartbeat()?;
    let previous_status = ctx.store.read_status()?;
    let throttle = ctx.store.read_throttle()?;

    tracing::debug!(
        api_url,
        observed = %observed,
        previous = ?previous.as_ref().map(|r| r.value.as_str()),
        last_status = ?previous_status.map(|s| s.status.as_str()),
        "Evaluating heartbeat"
    );

    let evaluation = evaluate(previous.as_ref(), &observed, previous_status);
    let decision = evaluation.decision;

    match decision {
        Decision::FirstRun => tracing::info!(api_url, "First heartbeat"),
        Decision::StillUp => tracing::info!(api_url, "Heartbeat up"),
        Decision::Recovered => tracing::info!(api_url, "Heartbeat up again after outage"),
        Decision::WentDown | Decision::StillDown => {
            tracing::error!(api_url, %decision, "Heartbeat down")
        }
    }

    let outcome = should_notify(
        decision,
        throttle.as_ref(),
        now,
        ctx.config.cooldown_minutes,
    );

    let mut delivery_error = None;
    if let Some(severity) = decision.severity().filter(|_| outcome.notify) {
        let message = queue_message(api_url, severity, ctx.config.broadcast);
        if let Err(e) = ctx.notifier.notify(&message, severity).await {
            tracing::error!(api_url, %decision, error = %e, "Failed to send notification");
            delivery_error = Some(e.to_string());
        }
    }

    // Heartbeat last, so a partial write leaves the old heartbeat in place.
    if let Some(record) = &evaluation.status {
        ctx.store.write_status(record)?;
    }
    if outcome.throttle != throttle {
        ctx.store.write_throttle(outcome.throttle.as_ref())?;
    }
    if let Some(record) = &evaluation.heartbeat {
        ctx.store.write_heartbeat(record)?;
    }

    Ok(RunReport {
        decision,
        observed,
        notified: outcome.notify,
        delivery_error,
    })
}
