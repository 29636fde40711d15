//! The cache itself
//!
//! [`DataFrameCache`] stores one frame per key as a pair of sibling
//! files in its directory. The public operation surface never returns an
//! error for expected failures: misses are `None`/`false`, and internal
//! errors are logged and flattened to the miss/failure value. Concurrent
//! instances over one directory coordinate only through filesystem
//! atomicity, exactly as the on-disk protocol requires.

use parking_lot::Mutex;
use std::path::Path;

use crate::config::DataFrameCacheConfig;
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::metadata::{self, EntryMetadata};
use crate::paths;
use crate::serializers::{self, FrameSerializer};
use crate::staging::{self, StagedWrite};
use crate::sweep;
use framestore_frame::DataFrame;

/// A filesystem-backed cache for data frames.
pub struct DataFrameCache {
    config: DataFrameCacheConfig,
    serializers: Vec<Box<dyn FrameSerializer>>,
    /// Serializes sweeps within this process. Correctness across
    /// processes rests on filesystem atomicity, not this lock.
    pub(crate) sweep_lock: Mutex<()>,
}

impl DataFrameCache {
    /// Open a cache over `config.cache_dir`, creating the directory if
    /// needed.
    pub fn new(config: DataFrameCacheConfig) -> Result<Self> {
        match std::fs::create_dir_all(&config.cache_dir) {
            Ok(()) => {}
            Err(e) => {
                return Err(CacheError::Io {
                    path: config.cache_dir.clone(),
                    operation: "create cache directory",
                    source: e,
                    recovery_hint: RecoveryHint::CheckPermissions {
                        path: config.cache_dir.clone(),
                    },
                });
            }
        }

        Ok(Self {
            config,
            serializers: serializers::default_chain(),
            sweep_lock: Mutex::new(()),
        })
    }

    /// Construct from a factory-style configuration mapping.
    pub fn from_mapping(mapping: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        Self::new(DataFrameCacheConfig::from_mapping(mapping)?)
    }

    pub fn config(&self) -> &DataFrameCacheConfig {
        &self.config
    }

    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_dir
    }

    /// Look up a frame. Returns `None` for absent, expired, or
    /// unreadable entries; an expired entry is evicted on the way out.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<DataFrame> {
        let stem = paths::stem_for(key.as_ref());
        match self.try_get(&stem) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(%stem, error = %e, "get failed; treating as miss");
                None
            }
        }
    }

    /// Store a frame. Returns `true` once both files are published.
    pub fn set(&self, key: impl AsRef<[u8]>, frame: &DataFrame, timeout: Option<u64>) -> bool {
        let stem = paths::stem_for(key.as_ref());
        match self.try_set(&stem, frame, timeout) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(%stem, error = %e, "set failed");
                false
            }
        }
    }

    /// Store a frame only when the key has no entry yet.
    pub fn add(&self, key: impl AsRef<[u8]>, frame: &DataFrame, timeout: Option<u64>) -> bool {
        let stem = paths::stem_for(key.as_ref());
        if paths::data_path(self.cache_dir(), &stem).exists() {
            return false;
        }
        match self.try_set(&stem, frame, timeout) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(%stem, error = %e, "add failed");
                false
            }
        }
    }

    /// Whether a live, decodable entry exists, without materializing it.
    pub fn has(&self, key: impl AsRef<[u8]>) -> bool {
        let stem = paths::stem_for(key.as_ref());
        let data_path = paths::data_path(self.cache_dir(), &stem);
        let meta_path = paths::metadata_path(self.cache_dir(), &stem);

        let record = EntryMetadata::load(&meta_path);
        if record.is_expired(metadata::unix_now()) {
            sweep::remove_entry_files(&data_path, &meta_path);
            return false;
        }
        let Some(tag) = record.format.as_deref() else {
            return false;
        };
        if serializers::find(&self.serializers, tag).is_none() {
            tracing::warn!(%stem, format = tag, "no decoder registered for cached format");
            return false;
        }
        data_path.is_file()
    }

    /// Remove an entry. Returns `true` only when both files were
    /// removed.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> bool {
        let stem = paths::stem_for(key.as_ref());
        let data_path = paths::data_path(self.cache_dir(), &stem);
        let meta_path = paths::metadata_path(self.cache_dir(), &stem);

        let mut removed = true;
        for path in [&data_path, &meta_path] {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::debug!("delete could not remove {}: {e}", path.display());
                removed = false;
            }
        }
        removed
    }

    /// Remove every entry. Returns `true` only when every removal
    /// succeeded; keeps going past failures so partial progress is made.
    pub fn clear(&self) -> bool {
        let entries = match paths::list_data_files(self.cache_dir()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("clear could not list cache directory: {e}");
                return false;
            }
        };

        let mut all_removed = true;
        for data_file in entries {
            let sidecar = paths::sidecar_for(&data_file);
            for path in [&data_file, &sidecar] {
                match std::fs::remove_file(path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        tracing::warn!("clear could not remove {}: {e}", path.display());
                        all_removed = false;
                    }
                }
            }
        }
        all_removed
    }

    /// Increment is not defined for tabular values.
    pub fn inc(&self, _key: impl AsRef<[u8]>, _delta: i64) -> Result<i64> {
        Err(CacheError::NotImplemented {
            operation: "inc",
            recovery_hint: RecoveryHint::Manual {
                instructions: "tabular values cannot be incremented".to_string(),
            },
        })
    }

    /// Decrement is not defined for tabular values.
    pub fn dec(&self, _key: impl AsRef<[u8]>, _delta: i64) -> Result<i64> {
        Err(CacheError::NotImplemented {
            operation: "dec",
            recovery_hint: RecoveryHint::Manual {
                instructions: "tabular values cannot be decremented".to_string(),
            },
        })
    }

    fn try_get(&self, stem: &str) -> Result<Option<DataFrame>> {
        let data_path = paths::data_path(self.cache_dir(), stem);
        let meta_path = paths::metadata_path(self.cache_dir(), stem);

        let record = EntryMetadata::load(&meta_path);
        if record.is_expired(metadata::unix_now()) {
            // Covers a genuinely expired entry and a data file whose
            // sidecar is missing or unreadable.
            sweep::remove_entry_files(&data_path, &meta_path);
            return Ok(None);
        }

        let Some(tag) = record.format.as_deref() else {
            tracing::debug!(%stem, "metadata has no format tag; miss");
            return Ok(None);
        };
        let Some(serializer) = serializers::find(&self.serializers, tag) else {
            tracing::warn!(%stem, format = tag, "no decoder registered for cached format");
            return Ok(None);
        };

        match serializer.decode(&data_path, record.read_args.as_ref()) {
            Ok(frame) => Ok(Some(frame)),
            // The data file vanished between the metadata read and the
            // decode; a concurrent eviction won the race.
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn try_set(&self, stem: &str, frame: &DataFrame, timeout: Option<u64>) -> Result<()> {
        self.run_sweep();

        let data_path = paths::data_path(self.cache_dir(), stem);
        let meta_path = paths::metadata_path(self.cache_dir(), stem);
        let expires = metadata::expires_from_timeout(
            timeout,
            self.config.default_timeout,
            metadata::unix_now(),
        );

        for serializer in &self.serializers {
            let mut stage = StagedWrite::new(self.cache_dir())?;
            let read_args = match serializer.encode(frame, &mut stage) {
                Ok(read_args) => read_args,
                Err(e) => {
                    tracing::debug!(
                        format = serializer.format_tag(),
                        error = %e,
                        "encoder refused value; trying next"
                    );
                    continue;
                }
            };

            stage.publish(&data_path, self.config.mode)?;

            let record = EntryMetadata::new(expires, serializer.format_tag(), read_args);
            let text = record.to_json(stem)?;
            staging::write_atomic_text(self.cache_dir(), &meta_path, &text, self.config.mode)?;
            return Ok(());
        }

        Err(CacheError::SerializationExhausted {
            key: stem.to_string(),
            recovery_hint: RecoveryHint::Manual {
                instructions: "value not representable by any registered serializer".to_string(),
            },
        })
    }
}

impl std::fmt::Debug for DataFrameCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFrameCache")
            .field("cache_dir", &self.config.cache_dir)
            .field("threshold", &self.config.threshold)
            .field("default_timeout", &self.config.default_timeout)
            .finish()
    }
}
