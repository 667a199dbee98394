//! Alert cooldown
//!
//! The cooldown is measured from the last alert that went out, so a long
//! outage re-alerts once per cooldown period.

use chrono::{DateTime, Utc};

use super::{Decision, ThrottleRecord};

/// Default minutes between two alerts of the same outage
pub const DEFAULT_COOLDOWN_MINUTES: u32 = 60;

/// Whether to notify, and the throttle record to persist afterwards
///
/// `throttle` is the complete new state: `None` means the record is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleOutcome {
    pub notify: bool,
    pub throttle: Option<ThrottleRecord>,
}

impl ThrottleOutcome {
    fn silent() -> Self {
        Self {
            notify: false,
            throttle: None,
        }
    }

    fn notify_at(now: DateTime<Utc>) -> Self {
        Self {
            notify: true,
            throttle: Some(ThrottleRecord::at(now)),
        }
    }
}

/// Apply the cooldown policy to a decision
pub fn should_notify(
    decision: Decision,
    throttle: Option<&ThrottleRecord>,
    now: DateTime<Utc>,
    cooldown_minutes: u32,
) -> ThrottleOutcome {
    match decision {
        Decision::FirstRun | Decision::StillUp => ThrottleOutcome::silent(),
        Decision::Recovered => ThrottleOutcome {
            notify: true,
            throttle: None,
        },
        Decision::WentDown => ThrottleOutcome::notify_at(now),
        Decision::StillDown => match throttle {
            // An alert was never recorded for this outage.
            None => ThrottleOutcome::notify_at(now),
            Some(record) => {
                let elapsed = now
                    .signed_duration_since(record.last_notified_at)
                    .num_minutes();
                if elapsed >= i64::from(cooldown_minutes) {
                    ThrottleOutcome::notify_at(now)
                } else {
                    tracing::info!(
                        elapsed_minutes = elapsed,
                        cooldown_minutes,
                        "Throttled error notification"
                    );
                    ThrottleOutcome {
                        notify: false,
                        throttle: Some(*record),
                    }
                }
            }
        },
    }
}
