//! Heartbeat evaluation

use super::{Decision, HeartbeatRecord, Status, StatusRecord};

/// Result of evaluating one observation
///
/// `heartbeat` and `status` hold the records the caller must persist; `None`
/// means the stored record stays as it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: Decision,
    pub heartbeat: Option<HeartbeatRecord>,
    pub status: Option<StatusRecord>,
}

/// Compare a fresh heartbeat against the previous one
///
/// Progress is detected purely by string inequality. A missing status record
/// counts as up.
pub fn evaluate(
    previous: Option<&HeartbeatRecord>,
    observed: &str,
    previous_status: Option<StatusRecord>,
) -> Evaluation {
    let previous = match previous {
        Some(previous) => previous,
        None => {
            return Evaluation {
                decision: Decision::FirstRun,
                heartbeat: Some(HeartbeatRecord::new(observed)),
                status: Some(StatusRecord::up()),
            }
        }
    };

    let was_down = previous_status.unwrap_or_default().status == Status::Down;

    if observed == previous.value {
        // Stalled. The stored heartbeat already holds this value.
        if was_down {
            Evaluation {
                decision: Decision::StillDown,
                heartbeat: None,
                status: None,
            }
        } else {
            Evaluation {
                decision: Decision::WentDown,
                heartbeat: None,
                status: Some(StatusRecord::down()),
            }
        }
    } else if was_down {
        Evaluation {
            decision: Decision::Recovered,
            heartbeat: Some(HeartbeatRecord::new(observed)),
            status: Some(StatusRecord::up()),
        }
    } else {
        Evaluation {
            decision: Decision::StillUp,
            heartbeat: Some(HeartbeatRecord::new(observed)),
            status: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: &str) -> HeartbeatRecord {
        HeartbeatRecord::new(value)
    }

    #[test]
    fn test_first_run() {
        let eval = evaluate(None, "2024-01-01T00:00:00Z", None);
        assert_eq!(eval.decision, Decision::FirstRun);
        assert_eq!(eval.heartbeat, Some(record("2024-01-01T00:00:00Z")));
        assert_eq!(eval.status, Some(StatusRecord::up()));
    }

    #[test]
    fn test_first_run_ignores_stale_status() {
        let eval = evaluate(None, "a", Some(StatusRecord::down()));
        assert_eq!(eval.decision, Decision::FirstRun);
        assert_eq!(eval.status, Some(StatusRecord::up()));
    }

    #[test]
    fn test_stall_while_up_goes_down() {
        for status in [Some(StatusRecord::up()), None] {
            let prev = record("2024-01-01 10:00:00");
            let eval = evaluate(Some(&prev), "2024-01-01 10:00:00", status);
            assert_eq!(eval.decision, Decision::WentDown);
            assert_eq!(eval.status, Some(StatusRecord::down()));
            assert_eq!(eval.heartbeat, None);
        }
    }

    #[test]
    fn test_stall_while_down_stays_down() {
        let prev = record("x");
        let eval = evaluate(Some(&prev), "x", Some(StatusRecord::down()));
        assert_eq!(eval.decision, Decision::StillDown);
        assert_eq!(eval.status, None);
        assert_eq!(eval.heartbeat, None);
    }

    #[test]
    fn test_progress_after_outage_recovers() {
        let prev = record("x");
        let eval = evaluate(Some(&prev), "y", Some(StatusRecord::down()));
        assert_eq!(eval.decision, Decision::Recovered);
        assert_eq!(eval.status, Some(StatusRecord::up()));
        assert_eq!(eval.heartbeat, Some(record("y")));
    }

    #[test]
    fn test_progress_while_up() {
        let prev = record("x");
        let eval = evaluate(Some(&prev), "y", Some(StatusRecord::up()));
        assert_eq!(eval.decision, Decision::StillUp);
        assert_eq!(eval.status, None);
        assert_eq!(eval.heartbeat, Some(record("y")));
    }

    #[test]
    fn test_comparison_is_exact() {
        // No trimming or timestamp parsing: these differ as strings.
        let prev = record("2024-01-01T00:00:00Z");
        let eval = evaluate(Some(&prev), "2024-01-01T00:00:00+00:00", None);
        assert_eq!(eval.decision, Decision::StillUp);

        let eval = evaluate(Some(&prev), "2024-01-01T00:00:00Z ", None);
        assert_eq!(eval.decision, Decision::StillUp);
    }
}
