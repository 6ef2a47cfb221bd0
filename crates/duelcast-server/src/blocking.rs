//! Running repository calls off the async workers.

use duelcast_core::StorageError;

/// Run a blocking store call on the blocking pool.
///
/// A panicked or cancelled task surfaces as [`StorageError::Task`].
pub async fn run_blocking<T, F>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_closure_value() {
        let value = run_blocking(|| Ok(41 + 1)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn propagates_storage_error() {
        let err = run_blocking::<(), _>(|| Err(StorageError::NotFound("g1".into())))
            .await
            .unwrap_err();
        assert_eq!(err, StorageError::NotFound("g1".into()));
    }

    #[tokio::test]
    async fn panic_becomes_task_error() {
        let err = run_blocking::<(), _>(|| panic!("boom")).await.unwrap_err();
        assert!(matches!(err, StorageError::Task(_)));
    }
}
