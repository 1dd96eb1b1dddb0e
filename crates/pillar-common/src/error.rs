//! Error types for PillarDB.

use thiserror::Error;

/// Result type alias using PillarError.
pub type Result<T> = std::result::Result<T, PillarError>;

/// Errors that can occur in PillarDB operations.
#[derive(Debug, Error)]
pub enum PillarError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Catalog errors
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Object already exists: {0}")]
    ObjectAlreadyExists(String),

    #[error("No active database")]
    NoActiveDatabase,

    // Operator errors
    #[error("Incorrect format: {0}")]
    IncorrectFormat(String),

    #[error("Invalid argument: {name} = {value}")]
    InvalidArgument { name: String, value: String },

    #[error("Query unsupported: {0}")]
    QueryUnsupported(String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Position {position} out of range for {len} rows")]
    PositionOutOfRange { position: i64, len: usize },

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    // Index errors
    #[error("Index entry not found: key {key}, position {position}")]
    IndexEntryNotFound { key: i32, position: usize },

    // Persistence errors
    #[error("Snapshot corrupted at offset {offset}: {reason}")]
    SnapshotCorrupted { offset: usize, reason: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PillarError {
    /// Builds an `InvalidArgument` from any displayable value.
    pub fn invalid_argument(name: &str, value: impl std::fmt::Display) -> Self {
        PillarError::InvalidArgument {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_conversion() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: PillarError = io_err.into();
        assert!(matches!(err, PillarError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_catalog_errors_display() {
        let err = PillarError::ObjectNotFound("db1.tbl1".to_string());
        assert_eq!(err.to_string(), "Object not found: db1.tbl1");

        let err = PillarError::ObjectAlreadyExists("db1".to_string());
        assert_eq!(err.to_string(), "Object already exists: db1");

        let err = PillarError::NoActiveDatabase;
        assert_eq!(err.to_string(), "No active database");
    }

    #[test]
    fn test_operator_errors_display() {
        let err = PillarError::IncorrectFormat("expected 3 values".to_string());
        assert_eq!(err.to_string(), "Incorrect format: expected 3 values");

        let err = PillarError::invalid_argument("thread_count", 0);
        assert_eq!(err.to_string(), "Invalid argument: thread_count = 0");

        let err = PillarError::QueryUnsupported("float join".to_string());
        assert_eq!(err.to_string(), "Query unsupported: float join");

        let err = PillarError::TypeMismatch {
            expected: "int".to_string(),
            actual: "float".to_string(),
        };
        assert_eq!(err.to_string(), "Type mismatch: expected int, got float");

        let err = PillarError::LengthMismatch { left: 3, right: 4 };
        assert_eq!(err.to_string(), "Length mismatch: 3 vs 4");

        let err = PillarError::PositionOutOfRange {
            position: -1,
            len: 10,
        };
        assert_eq!(err.to_string(), "Position -1 out of range for 10 rows");

        let err = PillarError::Overflow("sum exceeds i64".to_string());
        assert_eq!(err.to_string(), "Arithmetic overflow: sum exceeds i64");
    }

    #[test]
    fn test_index_errors_display() {
        let err = PillarError::IndexEntryNotFound {
            key: 42,
            position: 7,
        };
        assert_eq!(
            err.to_string(),
            "Index entry not found: key 42, position 7"
        );
    }

    #[test]
    fn test_snapshot_corrupted_display() {
        let err = PillarError::SnapshotCorrupted {
            offset: 128,
            reason: "checksum mismatch".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Snapshot corrupted at offset 128: checksum mismatch"
        );
    }

    #[test]
    fn test_config_and_internal_display() {
        let err = PillarError::Config("shared_scan_threads must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: shared_scan_threads must be > 0"
        );

        let err = PillarError::Internal("dangling node".to_string());
        assert_eq!(err.to_string(), "Internal error: dangling node");
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(PillarError::NoActiveDatabase)
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PillarError>();
    }
}
