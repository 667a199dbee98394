//! In-memory state store

use parking_lot::RwLock;

use super::{StateError, StateStore};
use crate::monitor::{HeartbeatRecord, StatusRecord, ThrottleRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryState {
    pub heartbeat: Option<HeartbeatRecord>,
    pub status: Option<StatusRecord>,
    pub throttle: Option<ThrottleRecord>,
}

/// State store that lives for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: RwLock<MemoryState>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing records
    pub fn with_state(state: MemoryState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of the current records
    pub fn snapshot(&self) -> MemoryState {
        self.state.read().clone()
    }
}

impl StateStore for MemoryStateStore {
    fn read_heartbeat(&self) -> Result<Option<HeartbeatRecord>, StateError> {
        Ok(self.state.read().heartbeat.clone())
    }

    fn write_heartbeat(&self, record: &HeartbeatRecord) -> Result<(), StateError> {
        self.state.write().heartbeat = Some(record.clone());
        Ok(())
    }

    fn read_status(&self) -> Result<Option<StatusRecord>, StateError> {
        Ok(self.state.read().status)
    }

    fn write_status(&self, record: &StatusRecord) -> Result<(), StateError> {
        self.state.write().status = Some(*record);
        Ok(())
    }

    fn read_throttle(&self) -> Result<Option<ThrottleRecord>, StateError> {
        Ok(self.state.read().throttle)
    }

    fn write_throttle(&self, record: Option<&ThrottleRecord>) -> Result<(), StateError> {
        self.state.write().throttle = record.copied();
        Ok(())
    }
}
