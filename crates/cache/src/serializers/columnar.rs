//! Columnar binary format
//!
//! The preferred encoding: named typed columns written as one bincode
//! document behind a magic/version header. It only handles frames whose
//! columns are homogeneously typed and whose index is the default
//! positional one; anything else is refused so the chain falls through
//! to the archive encoder.

use super::FrameSerializer;
use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use crate::staging::StagedWrite;
use framestore_frame::{Column, DataFrame};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Magic number for columnar files: "FSCL"
const COLUMNAR_MAGIC: u32 = 0x4653_434c;

/// Current columnar format version
const COLUMNAR_VERSION: u16 = 1;

#[derive(Serialize, Deserialize)]
struct ColumnarFile {
    magic: u32,
    version: u16,
    names: Vec<String>,
    columns: Vec<Column>,
}

pub struct ColumnarSerializer;

impl FrameSerializer for ColumnarSerializer {
    fn format_tag(&self) -> &'static str {
        "columnar"
    }

    fn encode(
        &self,
        frame: &DataFrame,
        stage: &mut StagedWrite,
    ) -> Result<Option<Map<String, Value>>> {
        if frame.has_mixed_columns() {
            return Err(CacheError::UnsupportedValue {
                format: self.format_tag(),
                reason: "frame has a heterogeneously typed column".to_string(),
                recovery_hint: RecoveryHint::Ignore,
            });
        }
        if frame.has_custom_index() {
            return Err(CacheError::UnsupportedValue {
                format: self.format_tag(),
                reason: "frame carries a non-default index".to_string(),
                recovery_hint: RecoveryHint::Ignore,
            });
        }

        let document = ColumnarFile {
            magic: COLUMNAR_MAGIC,
            version: COLUMNAR_VERSION,
            names: frame.column_names().map(str::to_string).collect(),
            columns: frame.iter().map(|(_, col)| col.clone()).collect(),
        };

        let path = stage.path().to_path_buf();
        let mut writer = BufWriter::new(stage.file()?);
        bincode::serialize_into(&mut writer, &document).map_err(|e| {
            CacheError::Serialization {
                key: path.display().to_string(),
                operation: SerializationOp::Encode,
                source: Box::new(e),
                recovery_hint: RecoveryHint::Ignore,
            }
        })?;
        writer.flush().map_err(|e| CacheError::Io {
            path,
            operation: "flush columnar data",
            source: e,
            recovery_hint: RecoveryHint::Retry {
                after: std::time::Duration::from_millis(10),
            },
        })?;
        Ok(None)
    }

    fn decode(&self, path: &Path, _read_args: Option<&Map<String, Value>>) -> Result<DataFrame> {
        let file = std::fs::File::open(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            operation: "open columnar data file",
            source: e,
            recovery_hint: RecoveryHint::ClearAndRetry,
        })?;

        let document: ColumnarFile = bincode::deserialize_from(BufReader::new(file)).map_err(
            |e| CacheError::Serialization {
                key: path.display().to_string(),
                operation: SerializationOp::Decode,
                source: Box::new(e),
                recovery_hint: RecoveryHint::ClearAndRetry,
            },
        )?;

        if document.magic != COLUMNAR_MAGIC {
            return Err(CacheError::Corruption {
                key: path.display().to_string(),
                reason: format!(
                    "invalid columnar magic: expected {COLUMNAR_MAGIC:08x}, got {:08x}",
                    document.magic
                ),
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }
        if document.version > COLUMNAR_VERSION {
            return Err(CacheError::Corruption {
                key: path.display().to_string(),
                reason: format!("unsupported columnar version {}", document.version),
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }
        if document.names.len() != document.columns.len() {
            return Err(CacheError::Corruption {
                key: path.display().to_string(),
                reason: format!(
                    "column name/data count mismatch: {} names, {} columns",
                    document.names.len(),
                    document.columns.len()
                ),
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }

        Ok(DataFrame::from_columns(
            document.names.into_iter().zip(document.columns),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_magic_is_corruption() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("entry.cached");
        let bogus = ColumnarFile {
            magic: 0xdead_beef,
            version: COLUMNAR_VERSION,
            names: vec![],
            columns: vec![],
        };
        std::fs::write(&path, bincode::serialize(&bogus).unwrap()).unwrap();
        let err = ColumnarSerializer.decode(&path, None).unwrap_err();
        assert!(matches!(err, CacheError::Corruption { .. }));
    }

    #[test]
    fn newer_version_is_refused() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("entry.cached");
        let future = ColumnarFile {
            magic: COLUMNAR_MAGIC,
            version: COLUMNAR_VERSION + 1,
            names: vec![],
            columns: vec![],
        };
        std::fs::write(&path, bincode::serialize(&future).unwrap()).unwrap();
        assert!(ColumnarSerializer.decode(&path, None).is_err());
    }

    #[test]
    fn ragged_homogeneous_frames_are_accepted() {
        let frame = DataFrame::from_columns([
            ("one", Column::Int64(vec![1, 2, 3])),
            ("pad", Column::Int64(vec![1, 2, 3, 4])),
        ]);
        let dir = tempfile::TempDir::new().unwrap();
        let dest = dir.path().join("entry.cached");
        let mut stage = StagedWrite::new(dir.path()).unwrap();
        ColumnarSerializer.encode(&frame, &mut stage).unwrap();
        stage.publish(&dest, 0o600).unwrap();
        assert_eq!(ColumnarSerializer.decode(&dest, None).unwrap(), frame);
    }
}
