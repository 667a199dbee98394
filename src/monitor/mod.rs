//! Heartbeat state machine
//!
//! Decides from one observation and the persisted records whether the
//! monitored queue is up or down, and whether an alert should go out.

pub mod evaluator;
pub mod runner;
pub mod throttle;

pub use evaluator::{evaluate, Evaluation};
pub use runner::{run_once, RunContext, RunReport};
pub use throttle::{should_notify, ThrottleOutcome, DEFAULT_COOLDOWN_MINUTES};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last observed heartbeat marker
///
/// The value is opaque and only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatRecord {
    pub value: String,
}

impl HeartbeatRecord {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Up/down status of the monitored system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Up,
    Down,
}

impl Status {
    /// Token written to the status file
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Up => "up",
            Status::Down => "down",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "up" => Ok(Status::Up),
            "down" => Ok(Status::Down),
            other => Err(format!("unknown status token {:?}", other)),
        }
    }
}

/// Last known status, changed only on a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusRecord {
    pub status: Status,
}

impl StatusRecord {
    pub fn up() -> Self {
        Self { status: Status::Up }
    }

    pub fn down() -> Self {
        Self {
            status: Status::Down,
        }
    }
}

/// When the last "down" alert of the current outage was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleRecord {
    pub last_notified_at: DateTime<Utc>,
}

impl ThrottleRecord {
    pub fn at(last_notified_at: DateTime<Utc>) -> Self {
        Self { last_notified_at }
    }
}

/// Outcome of evaluating one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No heartbeat recorded before this run
    FirstRun,
    /// Heartbeat advanced and the system was already up
    StillUp,
    /// Heartbeat stalled while the system was up
    WentDown,
    /// Heartbeat is still stalled
    StillDown,
    /// Heartbeat advanced after an outage
    Recovered,
}

impl Decision {
    /// Severity of the notification this decision may produce, if any
    pub fn severity(&self) -> Option<Severity> {
        match self {
            Decision::FirstRun | Decision::StillUp => None,
            Decision::WentDown | Decision::StillDown => Some(Severity::Alert),
            Decision::Recovered => Some(Severity::Recovery),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Decision::FirstRun => "first_run",
            Decision::StillUp => "still_up",
            Decision::WentDown => "went_down",
            Decision::StillDown => "still_down",
            Decision::Recovered => "recovered",
        };
        f.write_str(name)
    }
}

/// Notification severity, used to pick the message and icon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The queue stopped
    Alert,
    /// The queue restarted
    Recovery,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tokens() {
        assert_eq!("up".parse::<Status>().unwrap(), Status::Up);
        assert_eq!("down\n".parse::<Status>().unwrap(), Status::Down);
        assert!("sideways".parse::<Status>().is_err());
        assert_eq!(Status::Down.to_string(), "down");
    }

    #[test]
    fn test_decision_severity() {
        assert_eq!(Decision::FirstRun.severity(), None);
        assert_eq!(Decision::StillUp.severity(), None);
        assert_eq!(Decision::WentDown.severity(), Some(Severity::Alert));
        assert_eq!(Decision::StillDown.severity(), Some(Severity::Alert));
        assert_eq!(Decision::Recovered.severity(), Some(Severity::Recovery));
    }
}
