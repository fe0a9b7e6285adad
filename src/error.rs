use std::path::PathBuf;
use thiserror::Error;

/// Failures from the airport and favorite stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store worker is not running")]
    WorkerGone,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::StoreError;
    use std::path::PathBuf;

    #[test]
    fn open_error_mentions_path() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/airports.db",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(source) = result {
            let err = StoreError::Open {
                path: PathBuf::from("/nonexistent/path/airports.db"),
                source,
            };
            assert!(err.to_string().contains("/nonexistent/path/airports.db"));
        }
    }

    #[test]
    fn query_error_converts_from_rusqlite() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Query(_)));
        assert!(err.to_string().starts_with("database query failed"));
    }

    #[test]
    fn worker_gone_display() {
        assert_eq!(
            StoreError::WorkerGone.to_string(),
            "store worker is not running"
        );
    }
}
