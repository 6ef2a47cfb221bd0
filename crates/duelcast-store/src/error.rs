//! Store error type.

use duelcast_core::StorageError;

/// Failure inside the SQLite layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite rejected the statement.
    #[error("database error: {0}")]
    Database(String),

    /// No row for the requested key.
    #[error("not found: {0}")]
    NotFound(String),

    /// A row with the same key already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Filesystem failure creating the database directory.
    #[error("IO error: {0}")]
    Io(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<StoreError> for StorageError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => StorageError::NotFound(what),
            StoreError::Io(msg) => StorageError::Io(msg),
            StoreError::Database(msg) | StoreError::Conflict(msg) => StorageError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_storage_not_found() {
        let err: StorageError = StoreError::NotFound("round g1".into()).into();
        assert_eq!(err, StorageError::NotFound("round g1".into()));
    }

    #[test]
    fn conflict_maps_to_database() {
        let err: StorageError = StoreError::Conflict("dup".into()).into();
        assert!(matches!(err, StorageError::Database(_)));
    }

    #[test]
    fn rusqlite_error_converts() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Database(_)));
    }
}
