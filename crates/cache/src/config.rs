//! Cache configuration
//!
//! The external factory hands the cache a JSON-like mapping; this module
//! decodes it into a typed configuration with defaults for everything
//! except the cache directory.

use crate::errors::{CacheError, RecoveryHint, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Soft upper bound on live entries before a sweep fires.
fn default_threshold() -> usize {
    500
}

/// TTL in seconds applied when `set` omits one. `0` means never expire.
fn default_timeout() -> u64 {
    300
}

/// File mode applied to newly published files (Unix only).
fn default_mode() -> u32 {
    0o600
}

/// Configuration for a [`DataFrameCache`](crate::DataFrameCache).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFrameCacheConfig {
    /// Directory exclusively owned by this cache instance
    pub cache_dir: PathBuf,
    /// Soft upper bound on live entry count
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    /// Default TTL in seconds; `0` means entries never expire
    #[serde(default = "default_timeout")]
    pub default_timeout: u64,
    /// File mode for published files
    #[serde(default = "default_mode")]
    pub mode: u32,
}

impl DataFrameCacheConfig {
    /// Configuration with defaults for everything but the directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            threshold: default_threshold(),
            default_timeout: default_timeout(),
            mode: default_mode(),
        }
    }

    /// Decode a factory-style configuration mapping.
    ///
    /// `cache_dir` is mandatory; `threshold`, `default_timeout` and
    /// `mode` fall back to their defaults when absent.
    pub fn from_mapping(mapping: &Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(mapping.clone())).map_err(|e| {
            CacheError::Configuration {
                message: format!("invalid cache configuration mapping: {e}"),
                recovery_hint: RecoveryHint::Manual {
                    instructions: "provide at least a 'cache_dir' path".to_string(),
                },
            }
        })
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_default_timeout(mut self, seconds: u64) -> Self {
        self.default_timeout = seconds;
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_applied() {
        let config = DataFrameCacheConfig::new("/tmp/frames");
        assert_eq!(config.threshold, 500);
        assert_eq!(config.default_timeout, 300);
        assert_eq!(config.mode, 0o600);
    }

    #[test]
    fn mapping_with_only_dir() {
        let mapping = json!({"cache_dir": "/tmp/frames"});
        let config =
            DataFrameCacheConfig::from_mapping(mapping.as_object().unwrap()).unwrap();
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/frames"));
        assert_eq!(config.threshold, 500);
    }

    #[test]
    fn mapping_overrides() {
        let mapping = json!({
            "cache_dir": "/tmp/frames",
            "threshold": 13,
            "default_timeout": 0,
            "mode": 0o640,
        });
        let config =
            DataFrameCacheConfig::from_mapping(mapping.as_object().unwrap()).unwrap();
        assert_eq!(config.threshold, 13);
        assert_eq!(config.default_timeout, 0);
        assert_eq!(config.mode, 0o640);
    }

    #[test]
    fn mapping_without_dir_is_rejected() {
        let mapping = json!({"threshold": 13});
        let err =
            DataFrameCacheConfig::from_mapping(mapping.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, CacheError::Configuration { .. }));
    }
}
