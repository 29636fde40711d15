//! Direct bincode fallback
//!
//! Last in the chain: the whole frame serialized as-is. Accepts any
//! value the frame model can represent, so the chain never runs dry for
//! a well-formed frame.

use super::FrameSerializer;
use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use crate::staging::StagedWrite;
use framestore_frame::DataFrame;
use serde_json::{Map, Value};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub struct NativeSerializer;

impl FrameSerializer for NativeSerializer {
    fn format_tag(&self) -> &'static str {
        "bincode"
    }

    fn encode(
        &self,
        frame: &DataFrame,
        stage: &mut StagedWrite,
    ) -> Result<Option<Map<String, Value>>> {
        let path = stage.path().to_path_buf();
        let mut writer = BufWriter::new(stage.file()?);
        bincode::serialize_into(&mut writer, frame).map_err(|e| CacheError::Serialization {
            key: path.display().to_string(),
            operation: SerializationOp::Encode,
            source: Box::new(e),
            recovery_hint: RecoveryHint::Ignore,
        })?;
        writer.flush().map_err(|e| CacheError::Io {
            path,
            operation: "flush data file",
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
            operation: "open data file",
            source: e,
            recovery_hint: RecoveryHint::ClearAndRetry,
        })?;
        bincode::deserialize_from(BufReader::new(file)).map_err(|e| CacheError::Serialization {
            key: path.display().to_string(),
            operation: SerializationOp::Decode,
            source: Box::new(e),
            recovery_hint: RecoveryHint::ClearAndRetry,
        })
    }
}
