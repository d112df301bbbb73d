use std::time::Duration;
use thiserror::Error;

use crate::method::HostService;

/// Errors returned by the host service client
#[derive(Debug, Clone, Error)]
pub enum HostServiceError {
    /// The daemon executed the call and reported a failure
    #[error("{method} failed: {message}")]
    Call { method: String, message: String },

    /// No reply within the call timeout
    #[error("{method} timed out after {after:?}")]
    Timeout { method: String, after: Duration },

    /// The channel to the daemon could not be used at all
    #[error("host service unavailable: {0}")]
    Unavailable(String),

    /// A checkpoint for this service is already held by another session
    #[error("checkpoint already outstanding for {service}")]
    CheckpointOutstanding { service: HostService },

    /// Commit or restore named a checkpoint this client does not hold
    #[error("no outstanding checkpoint {token} for {service}")]
    UnknownCheckpoint { service: HostService, token: String },
}

pub type HostServiceResult<T> = Result<T, HostServiceError>;
