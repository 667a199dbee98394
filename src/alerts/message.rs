//! Alert message text

use crate::monitor::Severity;

/// Slack mention that notifies everyone in the channel
pub const BROADCAST_MARKER: &str = "<!channel|channel>";

/// Message announcing a stopped or restarted queue for `api_url`
pub fn queue_message(api_url: &str, severity: Severity, broadcast: bool) -> String {
    let body = match severity {
        Severity::Alert => format!(
            "The queue for API server {} appears to have stopped working",
            api_url
        ),
        Severity::Recovery => format!("The queue for API server {} has restarted.", api_url),
    };

    if broadcast {
        format!("{} {}", BROADCAST_MARKER, body)
    } else {
        body
    }
}
