//! File-backed state store
//!
//! Layout:
//! - heartbeat file: the raw heartbeat marker
//! - status file: `up` or `down`
//! - throttle file: JSON `{"last_notified_at": "<RFC 3339>"}`
//!
//! Every write goes to a sibling temp file which is synced and renamed over
//! the target, so a record is either the old or the new version.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{StateError, StateStore};
use crate::monitor::{HeartbeatRecord, Status, StatusRecord, ThrottleRecord};

/// State store keeping one file per record
#[derive(Debug, Clone)]
pub struct FileStateStore {
    heartbeat_path: PathBuf,
    status_path: PathBuf,
    throttle_path: PathBuf,
}

impl FileStateStore {
    pub fn new(
        heartbeat_path: impl Into<PathBuf>,
        status_path: impl Into<PathBuf>,
        throttle_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            heartbeat_path: heartbeat_path.into(),
            status_path: status_path.into(),
            throttle_path: throttle_path.into(),
        }
    }

    /// Store with all three files in one directory, using the default names
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(".heartbeat"),
            dir.join(".heartbeat.last-status"),
            dir.join(".properties"),
        )
    }

    pub fn heartbeat_path(&self) -> &Path {
        &self.heartbeat_path
    }

    pub fn status_path(&self) -> &Path {
        &self.status_path
    }

    pub fn throttle_path(&self) -> &Path {
        &self.throttle_path
    }
}

impl StateStore for FileStateStore {
    fn read_heartbeat(&self) -> Result<Option<HeartbeatRecord>, StateError> {
        Ok(read_optional(&self.heartbeat_path)?.map(HeartbeatRecord::new))
    }

    fn write_heartbeat(&self, record: &HeartbeatRecord) -> Result<(), StateError> {
        write_atomic(&self.heartbeat_path, record.value.as_bytes())
    }

    fn read_status(&self) -> Result<Option<StatusRecord>, StateError> {
        let Some(contents) = read_optional(&self.status_path)? else {
            return Ok(None);
        };
        let status = contents
            .parse::<Status>()
            .map_err(|reason| StateError::Corrupted {
                path: self.status_path.clone(),
                reason,
            })?;
        Ok(Some(StatusRecord { status }))
    }

    fn write_status(&self, record: &StatusRecord) -> Result<(), StateError> {
        write_atomic(&self.status_path, record.status.as_str().as_bytes())
    }

    fn read_throttle(&self) -> Result<Option<ThrottleRecord>, StateError> {
        let Some(contents) = read_optional(&self.throttle_path)? else {
            return Ok(None);
        };
        let record = serde_json::from_str::<ThrottleRecord>(&contents).map_err(|e| {
            StateError::Corrupted {
                path: self.throttle_path.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Some(record))
    }

    fn write_throttle(&self, record: Option<&ThrottleRecord>) -> Result<(), StateError> {
        match record {
            Some(record) => {
                let data = serde_json::to_vec(record)
                    .map_err(|e| StateError::Serialization(e.to_string()))?;
                write_atomic(&self.throttle_path, &data)
            }
            None => remove_if_exists(&self.throttle_path),
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, StateError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StateError::io(path, e)),
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StateError> {
    let tmp_path = temp_path(path);

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)
        .map_err(|e| StateError::io(&tmp_path, e))?;

    file.write_all(data)
        .and_then(|_| file.sync_all())
        .map_err(|e| StateError::io(&tmp_path, e))?;

    fs::rename(&tmp_path, path).map_err(|e| StateError::io(path, e))
}

fn remove_if_exists(path: &Path) -> Result<(), StateError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StateError::io(path, e)),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_empty_store_reads_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::in_dir(temp_dir.path());

        assert!(store.read_heartbeat().unwrap().is_none());
        assert!(store.read_status().unwrap().is_none());
        assert!(store.read_throttle().unwrap().is_none());
    }

    #[test]
    fn test_heartbeat_is_raw_text() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::in_dir(temp_dir.path());

        store
            .write_heartbeat(&HeartbeatRecord::new("2024-01-01 00:00:00"))
            .unwrap();

        let raw = fs::read_to_string(store.heartbeat_path()).unwrap();
        assert_eq!(raw, "2024-01-01 00:00:00");
        assert_eq!(
            store.read_heartbeat().unwrap(),
            Some(HeartbeatRecord::new("2024-01-01 00:00:00"))
        );
        assert!(!temp_path(store.heartbeat_path()).exists());
    }

    #[test]
    fn test_status_tokens_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::in_dir(temp_dir.path());

        store.write_status(&StatusRecord::down()).unwrap();
        assert_eq!(fs::read_to_string(store.status_path()).unwrap(), "down");
        assert_eq!(store.read_status().unwrap(), Some(StatusRecord::down()));

        store.write_status(&StatusRecord::up()).unwrap();
        assert_eq!(store.read_status().unwrap(), Some(StatusRecord::up()));
    }

    #[test]
    fn test_corrupted_status() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::in_dir(temp_dir.path());

        fs::write(store.status_path(), "maybe").unwrap();
        assert!(matches!(
            store.read_status(),
            Err(StateError::Corrupted { .. })
        ));
    }

    #[test]
    fn test_corrupted_throttle() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::in_dir(temp_dir.path());

        fs::write(store.throttle_path(), "{\"last_notified_at\": \"yesterday\"}").unwrap();
        assert!(matches!(
            store.read_throttle(),
            Err(StateError::Corrupted { .. })
        ));

        fs::write(store.throttle_path(), "not json").unwrap();
        assert!(matches!(
            store.read_throttle(),
            Err(StateError::Corrupted { .. })
        ));
    }

    #[test]
    fn test_throttle_write_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::in_dir(temp_dir.path());
        let record = ThrottleRecord::at(Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap());

        store.write_throttle(Some(&record)).unwrap();
        let raw = fs::read_to_string(store.throttle_path()).unwrap();
        assert!(raw.contains("last_notified_at"));
        assert!(raw.contains("2024-01-01T12:30:00Z"));
        assert_eq!(store.read_throttle().unwrap(), Some(record));

        store.write_throttle(None).unwrap();
        assert!(!store.throttle_path().exists());
        assert!(store.read_throttle().unwrap().is_none());

        // Deleting an absent record is fine.
        store.write_throttle(None).unwrap();
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::in_dir(temp_dir.path().join("missing"));

        let err = store
            .write_heartbeat(&HeartbeatRecord::new("x"))
            .unwrap_err();
        assert!(matches!(err, StateError::Io { .. }));
    }
}
