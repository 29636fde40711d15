//! Per-entry metadata sidecar
//!
//! A small UTF-8 JSON document beside each data file recording when the
//! entry expires, which serializer produced the data file, and any
//! arguments the decoder must be handed back. Unknown fields survive a
//! read/write round trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};

/// `expires` value meaning the entry never expires.
pub const NEVER_EXPIRES: i64 = 0;

/// `expires` value assumed when the sidecar is missing or unreadable.
pub const ALREADY_EXPIRED: i64 = -1;

/// The metadata record stored in an entry's sidecar file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Absolute expiration deadline in seconds since the epoch;
    /// [`NEVER_EXPIRES`] for permanent entries.
    pub expires: i64,
    /// Format tag of the serializer that produced the data file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Decoder arguments recorded by the encoder, passed back verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_args: Option<Map<String, Value>>,
    /// Fields this version does not recognize, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntryMetadata {
    pub fn new(expires: i64, format: &str, read_args: Option<Map<String, Value>>) -> Self {
        Self {
            expires,
            format: Some(format.to_string()),
            read_args,
            extra: Map::new(),
        }
    }

    /// The record assumed for a missing or unreadable sidecar.
    pub fn already_expired() -> Self {
        Self {
            expires: ALREADY_EXPIRED,
            format: None,
            read_args: None,
            extra: Map::new(),
        }
    }

    /// Load the sidecar at `path`.
    ///
    /// A missing or unparseable file yields the already-expired record,
    /// which makes the caller evict the entry rather than fail.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Self::already_expired();
            }
            Err(e) => {
                tracing::debug!("unreadable metadata sidecar {}: {e}", path.display());
                return Self::already_expired();
            }
        };
        match serde_json::from_str(&text) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("malformed metadata sidecar {}: {e}", path.display());
                Self::already_expired()
            }
        }
    }

    /// Render the record as the sidecar's UTF-8 text.
    pub fn to_json(&self, key: &str) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            operation: SerializationOp::Encode,
            source: Box::new(e),
            recovery_hint: RecoveryHint::Manual {
                instructions: "check metadata serialization".to_string(),
            },
        })
    }

    /// Whether the entry is still servable at `now`.
    pub fn is_live(&self, now: i64) -> bool {
        self.expires == NEVER_EXPIRES || self.expires > now
    }

    pub fn is_expired(&self, now: i64) -> bool {
        !self.is_live(now)
    }
}

/// Current wall clock in whole seconds since the epoch.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Convert a `set` timeout into an absolute `expires` deadline.
///
/// `None` uses the configured default; `0` (explicit or via the
/// default) means the entry never expires.
pub fn expires_from_timeout(timeout: Option<u64>, default_timeout: u64, now: i64) -> i64 {
    match timeout.unwrap_or(default_timeout) {
        0 => NEVER_EXPIRES,
        seconds => now + seconds as i64,
    }
}
