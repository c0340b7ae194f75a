use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or rejected the operation.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What the store was doing when it failed.
        message: String,
        /// Backend error that caused the failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A uniqueness constraint of the backend rejected the write.
    #[error("{entity} `{value}` already exists")]
    Duplicate {
        /// Kind of record, such as `team` or `round`.
        entity: &'static str,
        /// The conflicting value.
        value: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a duplicate error for the given entity kind and offending value.
    pub fn duplicate(entity: &'static str, value: impl Into<String>) -> Self {
        StorageError::Duplicate {
            entity,
            value: value.into(),
        }
    }
}
