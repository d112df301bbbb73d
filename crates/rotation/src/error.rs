//! Error types for the rotation engine and their mapping onto [`Status`].

use rotor_core::{Code, Status};
use rotor_hostsvc::HostServiceError;
use rotor_pathz::PathzError;
use rotor_statedb::KvError;
use std::path::PathBuf;
use thiserror::Error;

/// A rotation message that cannot be applied.
///
/// Every variant aborts the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required field missing or empty.
    #[error("{0}")]
    Malformed(String),

    /// Payload present but unusable (bad JSON, bad URL, empty rule set).
    #[error("{0}")]
    InvalidContent(String),

    /// Message does not fit the session it arrived in.
    #[error("{0}")]
    Conflict(String),
}

impl ValidationError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::InvalidContent(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::InvalidContent(_) => "invalid_content",
            Self::Conflict(_) => "conflict",
        }
    }

    /// Text safe for logs. Content errors may echo the uploaded document.
    pub fn log_text(&self) -> &str {
        match self {
            Self::Malformed(m) | Self::Conflict(m) => m,
            Self::InvalidContent(_) => "content rejected",
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Backing store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Error in reading file {}: not found. Please try Install.", path.display())]
    NotFound { path: PathBuf },

    #[error("checkpoint {} already exists", path.display())]
    CheckpointExists { path: PathBuf },

    #[error("{operation} {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file {} does not contain the written content", path.display())]
    Verify { path: PathBuf },

    #[error("failed to encode change: {0}")]
    Encode(String),

    #[error(transparent)]
    HostService(#[from] HostServiceError),

    #[error(transparent)]
    Pathz(#[from] PathzError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl StoreError {
    pub(crate) fn io(operation: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Freshness ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to read ledger {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write ledger {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("signing config record is corrupt: {0}")]
    Field(#[from] rotor_core::FieldParseError),

    #[error(transparent)]
    Kv(#[from] KvError),

    #[error("injected ledger failure: {0}")]
    Injected(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Server configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("unsupported config format for {} (expected .toml or .json)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load freshness ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("failed to recover interrupted rotation: {0}")]
    Recover(#[from] StoreError),

    #[error("server builder is missing {0}")]
    Missing(&'static str),
}

impl From<ValidationError> for Status {
    fn from(e: ValidationError) -> Self {
        Status::aborted(e.to_string())
    }
}

impl From<StoreError> for Status {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => Status::not_found(e.to_string()),
            other => Status::aborted(other.to_string()),
        }
    }
}

impl From<LedgerError> for Status {
    fn from(e: LedgerError) -> Self {
        Status::new(Code::Aborted, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn not_found_keeps_its_code() {
        let status: Status = StoreError::NotFound {
            path: PathBuf::from("/keys/gnmi_pathz.pb.txt"),
        }
        .into();
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(
            status.message(),
            "Error in reading file /keys/gnmi_pathz.pb.txt: not found. Please try Install."
        );
    }

    #[test]
    fn other_store_errors_abort() {
        let status: Status = StoreError::Verify {
            path: PathBuf::from("/keys/authz_policy.json"),
        }
        .into();
        assert_eq!(status.code(), Code::Aborted);
    }

    #[test]
    fn validation_error_message_passes_through() {
        let status: Status = ValidationError::malformed("version cannot be empty").into();
        assert_eq!(status.code(), Code::Aborted);
        assert_eq!(status.message(), "version cannot be empty");
    }

    #[test]
    fn content_errors_are_not_logged_verbatim() {
        let e = ValidationError::invalid_content("Authz policy `{secret` is malformed");
        assert_eq!(e.log_text(), "content rejected");
        assert_eq!(e.category(), "invalid_content");
    }
}
