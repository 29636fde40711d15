//! Error types for cache operations

mod display;
mod types;

pub use types::{CacheError, RecoveryHint, Result, SerializationOp};
