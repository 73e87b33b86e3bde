//! Shared error types for the services crate.

use thiserror::Error;

use spark_core::model::{ProgressError, QueueRejection};
use storage::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressStoreError {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Why `QueueStore::try_add_to_queue` did not add a topic.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QueueAddError {
    #[error("Already in queue")]
    AlreadyExists,
    #[error("Queue is full (max {max} topics)", max = spark_core::model::MAX_QUEUE_SIZE)]
    Full,
    #[error("Failed to add to queue: {0}")]
    Storage(#[from] StorageError),
}

impl QueueAddError {
    /// Machine-readable code: `ALREADY_EXISTS`, `QUEUE_FULL` or `ERROR`.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            QueueAddError::AlreadyExists => QueueRejection::AlreadyExists.code(),
            QueueAddError::Full => QueueRejection::Full.code(),
            QueueAddError::Storage(_) => "ERROR",
        }
    }

    /// Short user-facing message without backend detail.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            QueueAddError::Storage(_) => "Failed to add to queue".to_owned(),
            other => other.to_string(),
        }
    }
}

impl From<QueueRejection> for QueueAddError {
    fn from(rejection: QueueRejection) -> Self {
        match rejection {
            QueueRejection::AlreadyExists => QueueAddError::AlreadyExists,
            QueueRejection::Full => QueueAddError::Full,
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_errors_carry_codes_and_messages() {
        assert_eq!(QueueAddError::AlreadyExists.code(), "ALREADY_EXISTS");
        assert_eq!(QueueAddError::Full.code(), "QUEUE_FULL");
        assert_eq!(QueueAddError::Full.message(), "Queue is full (max 15 topics)");

        let io = QueueAddError::from(StorageError::Connection("disk gone".into()));
        assert_eq!(io.code(), "ERROR");
        assert_eq!(io.message(), "Failed to add to queue");
    }
}
