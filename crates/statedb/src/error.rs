use thiserror::Error;

/// State DB errors
#[derive(Debug, Clone, Error)]
pub enum KvError {
    /// The backend rejected or failed the command
    #[error("state db {operation} on `{key}` failed: {reason}")]
    Backend {
        operation: &'static str,
        key: String,
        reason: String,
    },

    /// No connection to the backend
    #[error("state db is not available: {0}")]
    Unavailable(String),
}

impl KvError {
    pub fn backend(operation: &'static str, key: &str, reason: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

pub type KvResult<T> = Result<T, KvError>;
