//! Threshold-triggered eviction sweep
//!
//! Every `set` runs a sweep first. When the directory's data-file count
//! reaches the configured threshold, expired entries are removed
//! along with every third listed entry. The positional rule is a
//! deliberately cheap approximate cull: one O(n) pass, no stat/sort of
//! ages, and it still guarantees forward progress on a full directory
//! while expired entries always go first.

use std::path::Path;

use crate::core::DataFrameCache;
use crate::metadata::{self, EntryMetadata, NEVER_EXPIRES};
use crate::paths;

impl DataFrameCache {
    /// Run one eviction pass over the cache directory.
    ///
    /// Per-entry failures are swallowed: a concurrent writer may have
    /// removed the same entry already.
    pub(crate) fn run_sweep(&self) {
        let _guard = self.sweep_lock.lock();

        let entries = match paths::list_data_files(self.cache_dir()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("sweep could not list cache directory: {e}");
                return;
            }
        };
        // Firing at the threshold (rather than strictly above it) keeps
        // the live entry count at or below the threshold after every
        // set, for any threshold value.
        if entries.len() < self.config().threshold {
            return;
        }

        let now = metadata::unix_now();
        let mut removed = 0usize;
        for (idx, data_file) in entries.iter().enumerate() {
            let sidecar = paths::sidecar_for(data_file);
            let record = EntryMetadata::load(&sidecar);
            let stale = record.expires != NEVER_EXPIRES && record.expires <= now;
            if stale || idx % 3 == 0 {
                remove_entry_files(data_file, &sidecar);
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(removed, total = entries.len(), "sweep removed entries");
        }
    }
}

/// Remove both files of an entry, tolerating files that are already
/// gone.
pub(crate) fn remove_entry_files(data_file: &Path, sidecar: &Path) {
    for path in [data_file, sidecar] {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("failed to remove cache file {}: {e}", path.display());
            }
        }
    }
}
