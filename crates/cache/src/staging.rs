//! Atomic file publication
//!
//! All cache files are staged into a temp file created in the cache
//! directory itself, then published with a rename. Staging in the same
//! directory keeps the rename on one filesystem, which is what makes it
//! atomic; a reader opening the destination sees either the old complete
//! contents or the new complete contents.

use crate::errors::{CacheError, RecoveryHint, Result};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// A data file being written but not yet published.
///
/// Encoders may write through the open handle or reopen the staged path,
/// whichever their format needs. Dropping the stage without publishing
/// removes the temp file.
pub struct StagedWrite {
    temp: NamedTempFile,
}

impl StagedWrite {
    /// Open a fresh temp file inside `cache_dir`.
    pub fn new(cache_dir: &Path) -> Result<Self> {
        let temp = NamedTempFile::new_in(cache_dir).map_err(|e| CacheError::Io {
            path: cache_dir.to_path_buf(),
            operation: "create staging file",
            source: e,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: cache_dir.to_path_buf(),
            },
        })?;
        Ok(Self { temp })
    }

    /// Path of the staged file, for encoders that write by path.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Open handle positioned at offset zero, for encoders that write
    /// through a handle.
    pub fn file(&mut self) -> Result<&mut File> {
        let path = self.temp.path().to_path_buf();
        let file = self.temp.as_file_mut();
        file.seek(SeekFrom::Start(0)).map_err(|e| CacheError::Io {
            path,
            operation: "rewind staging file",
            source: e,
            recovery_hint: RecoveryHint::Retry {
                after: std::time::Duration::from_millis(10),
            },
        })?;
        Ok(file)
    }

    /// Atomically publish the staged contents at `dest`.
    pub fn publish(self, dest: &Path, mode: u32) -> Result<()> {
        match self.temp.as_file().sync_all() {
            Ok(()) => {}
            Err(e) => {
                return Err(CacheError::Io {
                    path: self.temp.path().to_path_buf(),
                    operation: "sync staging file",
                    source: e,
                    recovery_hint: RecoveryHint::Retry {
                        after: std::time::Duration::from_millis(10),
                    },
                });
            }
        }

        self.temp.persist(dest).map_err(|e| CacheError::Io {
            path: dest.to_path_buf(),
            operation: "publish staged file",
            source: e.error,
            recovery_hint: RecoveryHint::Retry {
                after: std::time::Duration::from_millis(10),
            },
        })?;

        apply_mode(dest, mode);
        Ok(())
    }
}

/// Stage and publish a small UTF-8 text file (the metadata sidecar).
pub fn write_atomic_text(cache_dir: &Path, dest: &Path, content: &str, mode: u32) -> Result<()> {
    let mut stage = StagedWrite::new(cache_dir)?;
    let path = stage.path().to_path_buf();
    stage
        .file()?
        .write_all(content.as_bytes())
        .map_err(|e| CacheError::Io {
            path,
            operation: "write staging file",
            source: e,
            recovery_hint: RecoveryHint::Retry {
                after: std::time::Duration::from_millis(10),
            },
        })?;
    stage.publish(dest, mode)
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)) {
        tracing::debug!("failed to set mode {mode:o} on {}: {e}", path.display());
    }
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) {}
