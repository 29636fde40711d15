//! Display implementations for cache errors

use super::types::CacheError;
use std::fmt;

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                path,
                operation,
                source,
                ..
            } => write!(
                f,
                "I/O error during {} on '{}': {}",
                operation,
                path.display(),
                source
            ),
            Self::Serialization {
                key,
                operation,
                source,
                ..
            } => write!(f, "Failed to {operation:?} cache entry '{key}': {source}"),
            Self::UnsupportedValue { format, reason, .. } => {
                write!(f, "Value not supported by '{format}' encoder: {reason}")
            }
            Self::SerializationExhausted { key, .. } => {
                write!(f, "No serializer in the chain accepted the value for '{key}'")
            }
            Self::Corruption { key, reason, .. } => {
                write!(f, "Cache corruption detected for key '{key}': {reason}")
            }
            Self::Configuration { message, .. } => {
                write!(f, "Cache configuration error: {message}")
            }
            Self::NotImplemented { operation, .. } => {
                write!(f, "Operation '{operation}' is not implemented for tabular values")
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serialization { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{CacheError, RecoveryHint, SerializationOp};
    use std::path::PathBuf;

    #[test]
    fn io_error_names_path_and_operation() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/cache/abc.cached"),
            operation: "read data file",
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            recovery_hint: RecoveryHint::Ignore,
        };
        let text = err.to_string();
        assert!(text.contains("read data file"));
        assert!(text.contains("abc.cached"));
        assert!(err.is_not_found());
        assert!(matches!(err.recovery_hint(), RecoveryHint::Ignore));
    }

    #[test]
    fn serialization_error_carries_source() {
        let err = CacheError::Serialization {
            key: "deadbeef".to_string(),
            operation: SerializationOp::Decode,
            source: "bad payload".into(),
            recovery_hint: RecoveryHint::ClearAndRetry,
        };
        assert!(err.to_string().contains("deadbeef"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_not_found());
        assert!(matches!(
            err.recovery_hint(),
            RecoveryHint::ClearAndRetry
        ));
    }
}
