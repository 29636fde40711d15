//! Filesystem-backed cache for column-oriented data frames
//!
//! This crate provides [`DataFrameCache`], a disk cache that stores
//! tabular values as a pair of sibling files per entry: an encoded data
//! file and a small JSON sidecar recording expiration and the format the
//! data was written in. Writes stage into a same-directory temp file and
//! publish with an atomic rename, so readers never observe a
//! half-written entry. Disk footprint is bounded by a threshold-triggered
//! sweep that drops expired entries plus roughly a third of the rest.
//!
//! Values are encoded by an ordered serializer chain: a compact columnar
//! format for homogeneous frames, a keyed archive for frames the
//! columnar encoder rejects, and a direct bincode fallback for anything
//! else.

pub mod config;
pub mod core;
pub mod errors;
pub mod metadata;
pub mod paths;
pub mod serializers;
pub mod staging;

mod sweep;

pub use config::DataFrameCacheConfig;
pub use self::core::DataFrameCache;
pub use errors::{CacheError, RecoveryHint, Result, SerializationOp};
pub use metadata::EntryMetadata;
pub use paths::{DATA_SUFFIX, METADATA_SUFFIX};
pub use serializers::FrameSerializer;

pub use framestore_frame as frame;
pub use framestore_frame::{Cell, Column, DataFrame, Index};

#[cfg(test)]
mod tests;
