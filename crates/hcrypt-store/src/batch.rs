//! All-or-nothing publication of several files
//!
//! Staging writes every blob into a hidden sibling of its target. `commit`
//! then moves each existing target aside to a backup and renames the staged
//! file into place. If any step fails, targets already published are rolled
//! back (backup restored, or the new file removed) and leftover staging files
//! are deleted, so the previous set of files stays intact.

use std::fs;
use std::path::PathBuf;

use hcrypt_core::{HcryptError, HcryptResult};

use crate::store::{sibling, FileStore};

struct Staged {
    target: PathBuf,
    staging: PathBuf,
}

struct Published {
    target: PathBuf,
    backup: Option<PathBuf>,
}

pub struct WriteBatch<'a> {
    store: &'a FileStore,
    staged: Vec<Staged>,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(store: &'a FileStore) -> Self {
        Self {
            store,
            staged: Vec::new(),
        }
    }

    /// Write `bytes` to a staging file for `location`. Nothing is visible at
    /// `location` until [`commit`](Self::commit).
    pub fn stage(&mut self, location: impl Into<PathBuf>, bytes: &[u8]) -> HcryptResult<()> {
        let target = location.into();
        let staging = self.store.stage(&target, bytes)?;
        self.staged.push(Staged { target, staging });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Publish every staged file, or none of them.
    pub fn commit(mut self) -> HcryptResult<()> {
        let staged = std::mem::take(&mut self.staged);
        let mut published = Vec::with_capacity(staged.len());

        for (i, entry) in staged.iter().enumerate() {
            match publish(entry) {
                Ok(p) => published.push(p),
                Err(e) => {
                    tracing::warn!(
                        target_path = %entry.target.display(),
                        "batch commit failed, rolling back {} file(s)",
                        published.len()
                    );
                    rollback(&published);
                    for rest in &staged[i..] {
                        let _ = fs::remove_file(&rest.staging);
                    }
                    return Err(e);
                }
            }
        }

        for p in &published {
            if let Some(backup) = &p.backup {
                let _ = fs::remove_file(backup);
            }
        }
        tracing::debug!(files = published.len(), "batch committed");
        Ok(())
    }
}

impl Drop for WriteBatch<'_> {
    fn drop(&mut self) {
        for entry in self.staged.drain(..) {
            let _ = fs::remove_file(&entry.staging);
        }
    }
}

fn publish(entry: &Staged) -> HcryptResult<Published> {
    let backup = if entry.target.exists() {
        let backup = sibling(&entry.target, "bak")?;
        fs::rename(&entry.target, &backup).map_err(|e| HcryptError::io(&entry.target, e))?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = fs::rename(&entry.staging, &entry.target) {
        if let Some(backup) = &backup {
            let _ = fs::rename(backup, &entry.target);
        }
        return Err(HcryptError::io(&entry.target, e));
    }

    Ok(Published {
        target: entry.target.clone(),
        backup,
    })
}

fn rollback(published: &[Published]) {
    for p in published.iter().rev() {
        let restored = match &p.backup {
            Some(backup) => fs::rename(backup, &p.target),
            None => fs::remove_file(&p.target),
        };
        if let Err(e) = restored {
            tracing::error!(path = %p.target.display(), "rollback failed: {e}");
        }
    }
}
