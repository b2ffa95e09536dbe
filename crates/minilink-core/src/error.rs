use thiserror::Error;

/// Errors surfaced by the shortening and resolution core.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache initialization failed: {0}")]
    Initialization(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("alias already assigned: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

impl CoreError {
    /// Whether this error belongs to the internal-failure class.
    ///
    /// Internal failures carry backend details that should be logged but
    /// never shown to the caller; only [`CoreError::InvalidUrl`] is a client
    /// error.
    pub fn is_internal(&self) -> bool {
        !matches!(self, CoreError::InvalidUrl(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_invalid_url_is_a_client_error() {
        assert!(!CoreError::InvalidUrl("nope".to_string()).is_internal());
        assert!(CoreError::from(StorageError::Timeout("slow".to_string())).is_internal());
        assert!(CoreError::from(CacheError::Unavailable("down".to_string())).is_internal());
    }
}
