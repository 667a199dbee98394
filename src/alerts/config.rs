//! Notification target configuration

use crate::config::MonitorConfig;
use crate::monitor::Severity;

/// Where notifications are delivered
#[derive(Debug, Clone)]
pub enum NotifyTarget {
    /// Log to tracing
    Log,
    /// Slack incoming webhook
    Slack(SlackTarget),
}

/// Slack incoming webhook target
#[derive(Debug, Clone)]
pub struct SlackTarget {
    pub webhook_url: String,
    pub username: String,
    /// Icon for recovery messages
    pub emoji_beating: String,
    /// Icon for alert messages
    pub emoji_stopped: String,
}

impl SlackTarget {
    pub fn icon_for(&self, severity: Severity) -> &str {
        match severity {
            Severity::Alert => &self.emoji_stopped,
            Severity::Recovery => &self.emoji_beating,
        }
    }
}

impl NotifyTarget {
    /// Targets for a monitor configuration
    ///
    /// Without a webhook URL notifications are only logged.
    pub fn from_config(config: &MonitorConfig) -> Vec<NotifyTarget> {
        match &config.slack.webhook_url {
            Some(url) => vec![NotifyTarget::Slack(SlackTarget {
                webhook_url: url.clone(),
                username: config.slack.username.clone(),
                emoji_beating: config.slack.emoji_beating.clone(),
                emoji_stopped: config.slack.emoji_stopped.clone(),
            })],
            None => vec![NotifyTarget::Log],
        }
    }
}
