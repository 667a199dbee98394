//! Outbound alerts for stopped and restarted queues

pub mod config;
pub mod message;
pub mod notifier;

pub use config::{NotifyTarget, SlackTarget};
pub use message::queue_message;
pub use notifier::{Notifier, NotifierError};

use async_trait::async_trait;

use crate::monitor::Severity;

/// Delivery channel for alert messages
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn notify(&self, message: &str, severity: Severity) -> Result<(), NotifierError>;
}
