//! Keyed archive format
//!
//! Second in the chain: a container of named frames, with the cached
//! frame stored under a sub-key. The sub-key is recorded in the entry's
//! `read_args` and the decoder must be handed it back verbatim. Unlike
//! the columnar encoder this one accepts mixed-type columns and custom
//! indexes, so it catches everything the first encoder refuses.
//!
//! This encoder writes by path rather than through the staged handle.

use super::FrameSerializer;
use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use crate::staging::StagedWrite;
use framestore_frame::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::BufReader;
use std::path::Path;

/// Magic number for archive files: "FSAR"
const ARCHIVE_MAGIC: u32 = 0x4653_4152;

/// Current archive format version
const ARCHIVE_VERSION: u16 = 1;

/// Sub-key the cached frame is stored under.
const ARCHIVE_SUBKEY: &str = "frame";

#[derive(Serialize, Deserialize)]
struct ArchiveFile {
    magic: u32,
    version: u16,
    entries: Vec<(String, DataFrame)>,
}

pub struct ArchiveSerializer;

impl FrameSerializer for ArchiveSerializer {
    fn format_tag(&self) -> &'static str {
        "archive"
    }

    fn encode(
        &self,
        frame: &DataFrame,
        stage: &mut StagedWrite,
    ) -> Result<Option<Map<String, Value>>> {
        let document = ArchiveFile {
            magic: ARCHIVE_MAGIC,
            version: ARCHIVE_VERSION,
            entries: vec![(ARCHIVE_SUBKEY.to_string(), frame.clone())],
        };

        let path = stage.path().to_path_buf();
        let bytes = bincode::serialize(&document).map_err(|e| CacheError::Serialization {
            key: path.display().to_string(),
            operation: SerializationOp::Encode,
            source: Box::new(e),
            recovery_hint: RecoveryHint::Ignore,
        })?;
        std::fs::write(&path, bytes).map_err(|e| CacheError::Io {
            path: path.clone(),
            operation: "write staged archive",
            source: e,
            recovery_hint: RecoveryHint::Retry {
                after: std::time::Duration::from_millis(10),
            },
        })?;

        let mut read_args = Map::new();
        read_args.insert("key".to_string(), Value::String(ARCHIVE_SUBKEY.to_string()));
        Ok(Some(read_args))
    }

    fn decode(&self, path: &Path, read_args: Option<&Map<String, Value>>) -> Result<DataFrame> {
        let subkey = read_args
            .and_then(|args| args.get("key"))
            .and_then(Value::as_str)
            .unwrap_or(ARCHIVE_SUBKEY);

        let file = std::fs::File::open(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            operation: "open archive data file",
            source: e,
            recovery_hint: RecoveryHint::ClearAndRetry,
        })?;

        let document: ArchiveFile = bincode::deserialize_from(BufReader::new(file)).map_err(
            |e| CacheError::Serialization {
                key: path.display().to_string(),
                operation: SerializationOp::Decode,
                source: Box::new(e),
                recovery_hint: RecoveryHint::ClearAndRetry,
            },
        )?;

        if document.magic != ARCHIVE_MAGIC {
            return Err(CacheError::Corruption {
                key: path.display().to_string(),
                reason: format!(
                    "invalid archive magic: expected {ARCHIVE_MAGIC:08x}, got {:08x}",
                    document.magic
                ),
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }
        if document.version > ARCHIVE_VERSION {
            return Err(CacheError::Corruption {
                key: path.display().to_string(),
                reason: format!("unsupported archive version {}", document.version),
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }

        document
            .entries
            .into_iter()
            .find(|(name, _)| name == subkey)
            .map(|(_, frame)| frame)
            .ok_or_else(|| CacheError::Corruption {
                key: path.display().to_string(),
                reason: format!("archive has no entry under sub-key '{subkey}'"),
                recovery_hint: RecoveryHint::ClearAndRetry,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framestore_frame::Column;

    #[test]
    fn decode_without_read_args_uses_default_subkey() {
        let frame = DataFrame::from_columns([("one", Column::Int64(vec![1]))]);
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("entry.cached");
        let mut stage = StagedWrite::new(dir.path()).unwrap();
        ArchiveSerializer.encode(&frame, &mut stage).unwrap();
        stage.publish(&dest, 0o600).unwrap();

        assert_eq!(ArchiveSerializer.decode(&dest, None).unwrap(), frame);
    }

    #[test]
    fn truncated_archive_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("entry.cached");
        std::fs::write(&path, b"\x01\x02").unwrap();
        assert!(ArchiveSerializer.decode(&path, None).is_err());
    }
}
