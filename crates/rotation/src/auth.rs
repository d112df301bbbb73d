//! Caller authentication seam.

use async_trait::async_trait;
use rotor_core::Status;

use crate::stream::CallContext;

/// Resource class every Rotate RPC authenticates against.
pub const ROTATE_RESOURCE_CLASS: &str = "gnoi";

/// Authenticated caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub roles: Vec<String>,
}

/// Establishes who is calling. Runs before any guard or storage access;
/// its error is returned to the client unchanged.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(
        &self,
        context: &CallContext,
        resource_class: &str,
        requires_write: bool,
    ) -> Result<Identity, Status>;
}

/// Accepts every caller.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl Authenticator for AllowAll {
    async fn authenticate(
        &self,
        context: &CallContext,
        _resource_class: &str,
        _requires_write: bool,
    ) -> Result<Identity, Status> {
        Ok(Identity {
            username: context.peer.clone().unwrap_or_else(|| "test".to_string()),
            roles: vec!["admin".to_string()],
        })
    }
}

/// Rejects every caller with `Unauthenticated`.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl Authenticator for DenyAll {
    async fn authenticate(
        &self,
        _context: &CallContext,
        resource_class: &str,
        _requires_write: bool,
    ) -> Result<Identity, Status> {
        Err(Status::unauthenticated(format!(
            "no credentials for {resource_class}"
        )))
    }
}
