//! Persistent monitor state
//!
//! Three small records survive between scheduled runs: the last heartbeat,
//! the last known status and the alert throttle. Absence of a record is
//! decided here, once, and handed to the state machine as `None`.

pub mod file;
pub mod lock;
pub mod memory;

pub use file::FileStateStore;
pub use lock::RunLock;
pub use memory::MemoryStateStore;

use std::path::PathBuf;

use crate::monitor::{HeartbeatRecord, StatusRecord, ThrottleRecord};

/// Storage for the records of a single monitored target
pub trait StateStore: Send + Sync {
    /// Last observed heartbeat, `None` before the first run
    fn read_heartbeat(&self) -> Result<Option<HeartbeatRecord>, StateError>;

    fn write_heartbeat(&self, record: &HeartbeatRecord) -> Result<(), StateError>;

    /// Last known status, `None` when never written
    fn read_status(&self) -> Result<Option<StatusRecord>, StateError>;

    fn write_status(&self, record: &StatusRecord) -> Result<(), StateError>;

    /// Time of the last alert in the current outage
    fn read_throttle(&self) -> Result<Option<ThrottleRecord>, StateError>;

    /// Replace the throttle record; `None` deletes it
    fn write_throttle(&self, record: Option<&ThrottleRecord>) -> Result<(), StateError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupted state in {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    #[error("Another run holds the lock {0}")]
    Locked(PathBuf),
}

impl StateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StateError::Io {
            path: path.into(),
            source,
        }
    }
}
