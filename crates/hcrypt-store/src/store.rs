//! Scoped, atomic file reads and writes

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use hcrypt_core::{HcryptError, HcryptResult};

use crate::batch::WriteBatch;

/// Filesystem-backed byte store.
///
/// File handles are opened and closed inside each call; nothing is held
/// between operations.
#[derive(Debug, Clone)]
pub struct FileStore {
    durable: bool,
}

impl Default for FileStore {
    fn default() -> Self {
        Self { durable: true }
    }
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip `fsync` before publishing. Only for throwaway data.
    pub fn without_fsync() -> Self {
        Self { durable: false }
    }

    /// Read the whole blob at `location`.
    pub fn read(&self, location: &Path) -> HcryptResult<Vec<u8>> {
        let bytes = fs::read(location).map_err(|e| HcryptError::io(location, e))?;
        tracing::debug!(path = %location.display(), bytes = bytes.len(), "read blob");
        Ok(bytes)
    }

    /// Atomically replace the blob at `location`, creating parent directories.
    pub fn write(&self, location: &Path, bytes: &[u8]) -> HcryptResult<()> {
        let staging = self.stage(location, bytes)?;
        if let Err(e) = fs::rename(&staging, location) {
            let _ = fs::remove_file(&staging);
            return Err(HcryptError::io(location, e));
        }
        tracing::debug!(path = %location.display(), bytes = bytes.len(), "wrote blob");
        Ok(())
    }

    pub fn exists(&self, location: &Path) -> bool {
        location.is_file()
    }

    /// Start a batch of writes that are published together.
    pub fn batch(&self) -> WriteBatch<'_> {
        WriteBatch::new(self)
    }

    /// Write `bytes` into a fresh staging file next to `location` and return
    /// its path. On failure the staging file is removed.
    pub(crate) fn stage(&self, location: &Path, bytes: &[u8]) -> HcryptResult<PathBuf> {
        if let Some(parent) = location.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| HcryptError::io(parent, e))?;
            }
        }

        let staging = sibling(location, "tmp")?;
        let result = (|| -> std::io::Result<()> {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&staging)?;
            file.write_all(bytes)?;
            if self.durable {
                file.sync_all()?;
            }
            Ok(())
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&staging);
            return Err(HcryptError::io(location, e));
        }
        Ok(staging)
    }
}

/// Hidden, randomly named file in the same directory as `location`:
/// `.{name}.{random}.{suffix}`
pub(crate) fn sibling(location: &Path, suffix: &str) -> HcryptResult<PathBuf> {
    let name = location.file_name().ok_or_else(|| {
        HcryptError::io(
            location,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    Ok(location.with_file_name(format!(
        ".{}.{:016x}.{suffix}",
        name.to_string_lossy(),
        rand::random::<u64>()
    )))
}
