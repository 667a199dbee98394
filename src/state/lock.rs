//! Lock file guarding one read-evaluate-write cycle

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use super::StateError;

/// Exclusive advisory lock held for the duration of a run
///
/// The OS releases the lock when the holding process exits, so a run that
/// was killed never blocks the next one. The file itself stays in place and
/// records the pid of the last holder.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self, StateError> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StateError::io(&path, e))?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Err(StateError::Locked(path));
            }
            return Err(StateError::io(path, e));
        }

        // Owner pid helps when looking at a busy lock by hand.
        let recorded = file
            .set_len(0)
            .and_then(|_| file.seek(SeekFrom::Start(0)))
            .and_then(|_| writeln!(file, "{}", std::process::id()));
        if let Err(e) = recorded {
            tracing::debug!(path = %path.display(), error = %e, "Failed to write lock owner");
        }

        Ok(Self { file, path })
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to release run lock");
        }
    }
}
