//! Heartbeat observation sources

pub mod api;

pub use api::ApiSource;

use async_trait::async_trait;

/// Anything that can produce the current heartbeat marker
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Fetch the current heartbeat marker
    async fn observe(&self) -> Result<String, SourceError>;
}

/// Failures while fetching an observation
///
/// All of them abort the run without touching persisted state.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },

    #[error("Client setup failed: {0}")]
    Client(String),
}
