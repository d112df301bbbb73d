use thiserror::Error;

/// Pathz policy and lookup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathzError {
    #[error("no rules found")]
    NoRules,

    #[error("mode must be read or write")]
    InvalidMode,

    #[error("rule {rule_id}: key {rule_key} mismatch from other configured rule keyed by {node_key}")]
    KeyMismatch {
        rule_id: String,
        node_key: String,
        rule_key: String,
    },

    #[error("invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("failed to read policy file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to parse policy file {path}: {reason}")]
    Parse { path: String, reason: String },
}

pub type PathzResult<T> = Result<T, PathzError>;
