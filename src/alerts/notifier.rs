//! Notification handlers for alerts

use std::time::Duration;

use async_trait::async_trait;

use super::config::{NotifyTarget, SlackTarget};
use super::NotificationChannel;
use crate::monitor::Severity;

/// Notifier sending each message to every configured target
pub struct Notifier {
    client: reqwest::Client,
    targets: Vec<NotifyTarget>,
}

impl Notifier {
    /// Create a new notifier
    pub fn new(targets: Vec<NotifyTarget>) -> Result<Self, NotifierError> {
        Self::with_timeout(targets, Duration::from_secs(30))
    }

    pub fn with_timeout(
        targets: Vec<NotifyTarget>,
        timeout: Duration,
    ) -> Result<Self, NotifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::Client(e.to_string()))?;
        Ok(Self { client, targets })
    }

    /// Send a notification to a single target
    async fn notify_target(
        &self,
        target: &NotifyTarget,
        message: &str,
        severity: Severity,
    ) -> Result<(), NotifierError> {
        match target {
            NotifyTarget::Log => {
                match severity {
                    Severity::Alert => tracing::warn!(target_type = "log", "Alert: {}", message),
                    Severity::Recovery => {
                        tracing::info!(target_type = "log", "Recovery: {}", message)
                    }
                }
                Ok(())
            }
            NotifyTarget::Slack(slack) => self.send_slack(slack, message, severity).await,
        }
    }

    /// Post to a Slack incoming webhook
    async fn send_slack(
        &self,
        slack: &SlackTarget,
        message: &str,
        severity: Severity,
    ) -> Result<(), NotifierError> {
        let payload = slack_payload(slack, message, severity);

        let response = self
            .client
            .post(&slack.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifierError::Webhook(format!("Failed to send webhook: {}", e)))?;

        if !response.status().is_success() {
            return Err(NotifierError::Webhook(format!(
                "Webhook returned status {}",
                response.status()
            )));
        }

        tracing::debug!(username = %slack.username, "Slack notification sent");

        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for Notifier {
    async fn notify(&self, message: &str, severity: Severity) -> Result<(), NotifierError> {
        let mut errors = Vec::new();

        for target in &self.targets {
            if let Err(e) = self.notify_target(target, message, severity).await {
                errors.push(e);
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(NotifierError::Multiple(errors)),
        }
    }
}

/// Slack payload; icons starting with `:` are emoji, anything else a URL
fn slack_payload(slack: &SlackTarget, message: &str, severity: Severity) -> serde_json::Value {
    let icon = slack.icon_for(severity);
    if icon.starts_with(':') {
        serde_json::json!({
            "text": message,
            "username": slack.username,
            "icon_emoji": icon,
        })
    } else {
        serde_json::json!({
            "text": message,
            "username": slack.username,
            "icon_url": icon,
        })
    }
}

/// Notifier errors
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Webhook error: {0}")]
    Webhook(String),

    #[error("Multiple notification failures: {0:?}")]
    Multiple(Vec<NotifierError>),
}
