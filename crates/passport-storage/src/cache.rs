//! The session file itself: atomic writes, staleness reaping, corruption
//! absorption.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::record::{local_trust_window, LocalSessionRecord};
use crate::traits::AtRestProtector;
use crate::{StorageError, StorageResult};

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// One encrypted session record at a fixed path, shared by every client
/// process on the machine.
pub struct SessionFileCache {
    path: PathBuf,
    protector: Box<dyn AtRestProtector>,
    now: Clock,
}

impl SessionFileCache {
    pub fn new(path: PathBuf, protector: Box<dyn AtRestProtector>) -> Self {
        Self {
            path,
            protector,
            now: Box::new(Utc::now),
        }
    }

    /// Injectable clock for staleness tests.
    pub fn with_clock(path: PathBuf, protector: Box<dyn AtRestProtector>, now: Clock) -> Self {
        Self {
            path,
            protector,
            now,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate, serialize, protect, and write via temp-file-then-rename.
    /// A concurrent reader never observes a partially written file.
    pub fn write(&self, record: &LocalSessionRecord) -> StorageResult<()> {
        record
            .ensure_well_formed()
            .map_err(StorageError::InvalidRecord)?;

        let json = serde_json::to_vec(record)
            .map_err(|e| StorageError::Encoding(format!("serialize record: {e}")))?;
        let payload = self.protector.protect(&json);

        let parent = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&parent)?;

        let tmp = parent.join(format!(
            ".session.{:08x}.tmp",
            rand::thread_rng().gen::<u32>()
        ));
        let result = (|| -> StorageResult<()> {
            use std::io::Write;
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(payload.as_bytes())?;
            file.sync_all()?;
            std::fs::rename(&tmp, &self.path)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = std::fs::remove_file(&tmp);
        } else {
            debug!(path = ?self.path, "session record written");
        }
        result
    }

    /// Read the record back.
    ///
    /// A file older than the trust window is a leftover: it is deleted and
    /// reported as `NotFound` regardless of content. Decode, parse, and
    /// field failures all surface as `Corrupted`, never as a raw error.
    pub fn read(&self) -> StorageResult<LocalSessionRecord> {
        if !self.path.exists() {
            return Err(StorageError::NotFound);
        }

        if self.is_stale()? {
            info!(path = ?self.path, "stale session file reaped");
            self.delete()?;
            return Err(StorageError::NotFound);
        }

        let payload = std::fs::read_to_string(&self.path)
            .map_err(|e| StorageError::Corrupted(format!("unreadable: {e}")))?;

        let json = self
            .protector
            .unprotect(&payload)
            .map_err(|e| StorageError::Corrupted(format!("decode: {e}")))?;

        let record: LocalSessionRecord = serde_json::from_slice(&json)
            .map_err(|e| StorageError::Corrupted(format!("parse: {e}")))?;

        record
            .ensure_well_formed()
            .map_err(StorageError::Corrupted)?;

        Ok(record)
    }

    /// Idempotent: a missing file is a success.
    pub fn delete(&self) -> StorageResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = ?self.path, "session record deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "failed to delete session record");
                Err(e.into())
            }
        }
    }

    /// Last-write age exceeds the trust window. mtime stands in for the
    /// write time; ctime is not controllable on every platform.
    fn is_stale(&self) -> StorageResult<bool> {
        let metadata = std::fs::metadata(&self.path)?;
        let modified: DateTime<Utc> = metadata.modified()?.into();
        Ok((self.now)() - modified > local_trust_window())
    }
}
