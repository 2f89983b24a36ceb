//! A single cache file on disk
//!
//! `CacheFile` owns the open descriptor and the advisory lock state for one
//! entry. Expiration lives in the file's modification time.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use crate::cache::ttl::Expiration;
use crate::core::clock::{unix_seconds, Clock};
use crate::core::error::Result;

/// Handle for one cache file
#[derive(Debug)]
pub struct CacheFile {
    path: PathBuf,
    file: Option<File>,
    locked: bool,
    clock: Arc<dyn Clock>,
}

impl CacheFile {
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            file: None,
            locked: false,
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this handle currently holds the advisory lock
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Size of the file in bytes, or `None` if it does not exist
    pub fn size(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|m| m.len())
    }

    /// Modification time in seconds since the epoch, or `None` if the file
    /// does not exist
    pub fn expiration(&self) -> Option<i64> {
        let modified = fs::metadata(&self.path).ok()?.modified().ok()?;
        Some(unix_seconds(modified))
    }

    /// Expired according to the store clock. Missing files and the
    /// never-expires sentinel are not expired.
    pub fn is_expired(&self) -> bool {
        match self.expiration() {
            None => false,
            Some(timestamp) => Expiration::from_timestamp(timestamp).is_expired_at(self.clock.now()),
        }
    }

    /// Set the modification time. The file must already exist.
    pub fn set_expiration(&self, timestamp: i64) -> Result<()> {
        let file = OpenOptions::new().write(true).open(&self.path)?;
        file.set_modified(system_time(timestamp))?;
        Ok(())
    }

    /// Open for read/write, creating the file if needed. Reuses the
    /// descriptor when already open and the path still names the same file;
    /// a descriptor left on a deleted or replaced file is closed and reopened.
    pub fn open(&mut self) -> Result<&mut File> {
        if self.file.as_ref().is_some_and(|file| !self.is_current(file)) {
            debug!(path = %self.path.display(), "file replaced on disk, reopening");
            self.close();
        }

        let file = match self.file.take() {
            Some(file) => file,
            None => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&self.path)?,
        };
        Ok(self.file.insert(file))
    }

    /// Read the whole file from the start
    pub fn read(&mut self) -> Result<String> {
        let file = self.open()?;
        file.seek(SeekFrom::Start(0))?;

        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Replace the file contents, then close the handle.
    ///
    /// Closing releases a lock held through this handle.
    pub fn write(&mut self, content: &str) -> Result<()> {
        let result = self.replace_contents(content.as_bytes());
        self.close();
        result
    }

    fn replace_contents(&mut self, bytes: &[u8]) -> Result<()> {
        let file = self.open()?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(())
    }

    /// Try to take the exclusive advisory lock without blocking.
    ///
    /// Returns false if the file cannot be opened, another holder has the
    /// lock, or this handle already holds it.
    pub fn lock(&mut self) -> bool {
        if self.locked {
            if self.file.as_ref().is_some_and(|file| self.is_current(file)) {
                debug!(path = %self.path.display(), "lock already held by this handle");
                return false;
            }
            // Held on a file that has since been deleted or replaced
            self.close();
        }

        let acquired = match self.open() {
            Ok(file) => file.try_lock_exclusive(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to open for locking");
                self.locked = false;
                return false;
            }
        };

        match acquired {
            Ok(()) => {
                debug!(path = %self.path.display(), "lock acquired");
                self.locked = true;
            }
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "lock not acquired");
                self.locked = false;
            }
        }

        self.locked
    }

    /// Release the lock. A handle that holds no lock succeeds trivially.
    pub fn unlock(&mut self) -> bool {
        if !self.locked {
            return true;
        }

        self.locked = false;
        match &self.file {
            Some(file) => match FileExt::unlock(file) {
                Ok(()) => true,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "failed to release lock");
                    false
                }
            },
            None => true,
        }
    }

    /// Release the lock, if any, and drop the descriptor
    pub fn close(&mut self) {
        if self.file.is_none() {
            return;
        }

        self.unlock();
        self.file = None;
    }

    /// Close, then remove the file. Returns whether the file is gone.
    pub fn delete(&mut self) -> Result<bool> {
        self.close();

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(!self.exists())
    }

    /// Whether `file` is still the file at `self.path`
    fn is_current(&self, file: &File) -> bool {
        match (file.metadata(), fs::metadata(&self.path)) {
            (Ok(open), Ok(on_disk)) => same_file(&open, &on_disk),
            _ => false,
        }
    }
}

impl Drop for CacheFile {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(unix)]
fn same_file(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_file(a: &fs::Metadata, b: &fs::Metadata) -> bool {
    a.len() == b.len() && a.modified().ok() == b.modified().ok()
}

fn system_time(timestamp: i64) -> SystemTime {
    if timestamp >= 0 {
        SystemTime::UNIX_EPOCH + Duration::from_secs(timestamp as u64)
    } else {
        SystemTime::UNIX_EPOCH - Duration::from_secs(timestamp.unsigned_abs())
    }
}
