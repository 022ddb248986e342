//! Document store error types
//!
//! Defines all errors that can occur in the storage layer.

use thiserror::Error;

/// Errors that can occur in the document store
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operation failed (data directory, blob files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite rejected a statement
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization of an embedded JSON field failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Requested document does not exist
    #[error("{collection} document not found: {id}")]
    NotFound { collection: &'static str, id: String },

    /// A unique field already holds this value
    #[error("Duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl StoreError {
    pub fn not_found(collection: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            collection,
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::not_found("services", "abc");
        assert_eq!(err.to_string(), "services document not found: abc");

        let err = StoreError::Duplicate {
            field: "email",
            value: "amanda@salon.test".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate email: amanda@salon.test");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let store_err: StoreError = io_err.into();
        assert!(matches!(store_err, StoreError::Io(_)));
    }
}
