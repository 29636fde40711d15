//! Key-to-path mapping and directory listing
//!
//! Every entry is a pair of sibling files under the cache directory
//! sharing a hashed stem: `<stem>.cached` for the encoded frame and
//! `<stem>.metadata` for the JSON sidecar. Files with any other suffix
//! are foreign and ignored.

use crate::errors::{CacheError, RecoveryHint, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Suffix of the encoded data file
pub const DATA_SUFFIX: &str = ".cached";

/// Suffix of the metadata sidecar
pub const METADATA_SUFFIX: &str = ".metadata";

/// Map a key to its filesystem-safe stem.
///
/// Pure function of the key bytes; collision-resistant via SHA-256.
#[inline]
pub fn stem_for(key: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key);
    format!("{:x}", hasher.finalize())
}

/// Absolute path of the data file for `stem`.
pub fn data_path(cache_dir: &Path, stem: &str) -> PathBuf {
    cache_dir.join(format!("{stem}{DATA_SUFFIX}"))
}

/// Absolute path of the sidecar for `stem`.
pub fn metadata_path(cache_dir: &Path, stem: &str) -> PathBuf {
    cache_dir.join(format!("{stem}{METADATA_SUFFIX}"))
}

/// Sidecar path belonging to a listed data file.
pub fn sidecar_for(data_file: &Path) -> PathBuf {
    let name = data_file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let stem = name.strip_suffix(DATA_SUFFIX).unwrap_or(name);
    data_file.with_file_name(format!("{stem}{METADATA_SUFFIX}"))
}

/// Enumerate data files in the cache directory.
///
/// Only names ending in [`DATA_SUFFIX`] are returned; temp files and
/// sidecars are skipped. The listing is sorted by file name so a sweep
/// iterates a stable order.
pub fn list_data_files(cache_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(cache_dir).map_err(|e| CacheError::Io {
        path: cache_dir.to_path_buf(),
        operation: "list cache directory",
        source: e,
        recovery_hint: RecoveryHint::CheckPermissions {
            path: cache_dir.to_path_buf(),
        },
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("error reading cache directory entry: {e}");
                continue;
            }
        };
        let path = entry.path();
        let is_data = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(DATA_SUFFIX));
        if is_data {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stem_is_stable_and_distinct() {
        assert_eq!(stem_for(b"foo"), stem_for(b"foo"));
        assert_ne!(stem_for(b"foo"), stem_for(b"bar"));
        assert_eq!(stem_for(b"foo").len(), 64);
    }

    #[test]
    fn entry_paths_share_a_stem() {
        let dir = Path::new("/cache");
        let stem = stem_for(b"k");
        let data = data_path(dir, &stem);
        let meta = metadata_path(dir, &stem);
        assert!(data.to_str().unwrap().ends_with(DATA_SUFFIX));
        assert!(meta.to_str().unwrap().ends_with(METADATA_SUFFIX));
        assert_eq!(sidecar_for(&data), meta);
    }

    #[test]
    fn listing_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.cached"), b"x").unwrap();
        std::fs::write(dir.path().join("a.metadata"), b"{}").unwrap();
        std::fs::write(dir.path().join("b.cached"), b"y").unwrap();
        std::fs::write(dir.path().join(".tmp123"), b"staging").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"foreign").unwrap();

        let files = list_data_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.cached", "b.cached"]);
    }

    #[test]
    fn listing_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("nope");
        assert!(list_data_files(&gone).is_err());
    }
}
