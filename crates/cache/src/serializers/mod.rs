//! The serializer chain
//!
//! An ordered list of candidate encoders tried on every `set`. The first
//! encoder that accepts the value wins and its tag is recorded in the
//! entry's sidecar; on `get` the tag selects the matching decoder. Later
//! entries accept values the earlier ones reject, ending in a universal
//! fallback, so at least one member can store any frame.

mod archive;
mod columnar;
mod native;

pub use archive::ArchiveSerializer;
pub use columnar::ColumnarSerializer;
pub use native::NativeSerializer;

use crate::errors::Result;
use crate::staging::StagedWrite;
use framestore_frame::DataFrame;
use serde_json::{Map, Value};
use std::path::Path;

/// One member of the serializer chain.
pub trait FrameSerializer: Send + Sync {
    /// Tag recorded in the metadata sidecar and used for decoder lookup.
    fn format_tag(&self) -> &'static str;

    /// Encode `frame` into the staged file.
    ///
    /// Returns the `read_args` the decoder must be handed back, if any.
    /// An error discards the stage and the driver tries the next chain
    /// entry.
    fn encode(
        &self,
        frame: &DataFrame,
        stage: &mut StagedWrite,
    ) -> Result<Option<Map<String, Value>>>;

    /// Decode the data file at `path`, honoring recorded `read_args`.
    fn decode(&self, path: &Path, read_args: Option<&Map<String, Value>>) -> Result<DataFrame>;
}

/// The canonical chain: columnar, then archive, then bincode fallback.
pub fn default_chain() -> Vec<Box<dyn FrameSerializer>> {
    vec![
        Box::new(ColumnarSerializer),
        Box::new(ArchiveSerializer),
        Box::new(NativeSerializer),
    ]
}

/// Look up a decoder by its recorded format tag.
pub fn find<'a>(
    chain: &'a [Box<dyn FrameSerializer>],
    tag: &str,
) -> Option<&'a dyn FrameSerializer> {
    chain
        .iter()
        .find(|s| s.format_tag() == tag)
        .map(|s| s.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CacheError;
    use framestore_frame::{Cell, Column, Index};
    use tempfile::TempDir;

    fn homogeneous() -> DataFrame {
        DataFrame::from_columns([
            ("one", Column::Int64(vec![1, 2, 3])),
            ("two", Column::Float64(vec![0.5, 1.5, 2.5])),
        ])
    }

    fn awkward() -> DataFrame {
        DataFrame::from_columns([(
            "mixed",
            Column::Mixed(vec![Cell::Int(1), Cell::Str("x".into()), Cell::Null]),
        )])
        .with_index(Index::Labels(vec![Cell::Int(7), Cell::Int(8), Cell::Int(9)]))
    }

    fn round_trip(serializer: &dyn FrameSerializer, frame: &DataFrame) -> DataFrame {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("entry.cached");
        let mut stage = StagedWrite::new(dir.path()).unwrap();
        let read_args = serializer.encode(frame, &mut stage).unwrap();
        stage.publish(&dest, 0o600).unwrap();
        serializer.decode(&dest, read_args.as_ref()).unwrap()
    }

    #[test]
    fn chain_order_is_fixed() {
        let chain = default_chain();
        let tags: Vec<_> = chain.iter().map(|s| s.format_tag()).collect();
        assert_eq!(tags, vec!["columnar", "archive", "bincode"]);
    }

    #[test]
    fn lookup_by_tag() {
        let chain = default_chain();
        assert!(find(&chain, "archive").is_some());
        assert!(find(&chain, "parquet").is_none());
    }

    #[test]
    fn columnar_round_trips_homogeneous_frames() {
        let frame = homogeneous();
        assert_eq!(round_trip(&ColumnarSerializer, &frame), frame);
    }

    #[test]
    fn columnar_rejects_mixed_columns() {
        let dir = TempDir::new().unwrap();
        let mut stage = StagedWrite::new(dir.path()).unwrap();
        let err = ColumnarSerializer.encode(&awkward(), &mut stage).unwrap_err();
        assert!(matches!(err, CacheError::UnsupportedValue { .. }));
    }

    #[test]
    fn columnar_rejects_custom_index_alone() {
        let frame = homogeneous().with_index(Index::Labels(vec![
            Cell::Str("a".into()),
            Cell::Str("b".into()),
            Cell::Str("c".into()),
        ]));
        let dir = TempDir::new().unwrap();
        let mut stage = StagedWrite::new(dir.path()).unwrap();
        let err = ColumnarSerializer.encode(&frame, &mut stage).unwrap_err();
        assert!(matches!(err, CacheError::UnsupportedValue { .. }));
    }

    #[test]
    fn archive_round_trips_anything_and_records_read_args() {
        let frame = awkward();
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("entry.cached");
        let mut stage = StagedWrite::new(dir.path()).unwrap();
        let read_args = ArchiveSerializer.encode(&frame, &mut stage).unwrap();
        stage.publish(&dest, 0o600).unwrap();

        let args = read_args.expect("archive must record read_args");
        assert_eq!(args.get("key").and_then(|v| v.as_str()), Some("frame"));
        assert_eq!(
            ArchiveSerializer.decode(&dest, Some(&args)).unwrap(),
            frame
        );
    }

    #[test]
    fn archive_missing_subkey_is_corruption() {
        let frame = homogeneous();
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("entry.cached");
        let mut stage = StagedWrite::new(dir.path()).unwrap();
        ArchiveSerializer.encode(&frame, &mut stage).unwrap();
        stage.publish(&dest, 0o600).unwrap();

        let mut args = Map::new();
        args.insert("key".to_string(), serde_json::json!("wrong"));
        let err = ArchiveSerializer.decode(&dest, Some(&args)).unwrap_err();
        assert!(matches!(err, CacheError::Corruption { .. }));
    }

    #[test]
    fn native_round_trips_anything() {
        for frame in [homogeneous(), awkward(), DataFrame::new()] {
            assert_eq!(round_trip(&NativeSerializer, &frame), frame);
        }
    }

    #[test]
    fn decoders_reject_each_others_files() {
        let frame = homogeneous();
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("entry.cached");
        let mut stage = StagedWrite::new(dir.path()).unwrap();
        ColumnarSerializer.encode(&frame, &mut stage).unwrap();
        stage.publish(&dest, 0o600).unwrap();

        // An archive decoder pointed at a columnar file must error, not
        // hand back garbage.
        assert!(ArchiveSerializer.decode(&dest, None).is_err());
    }
}
