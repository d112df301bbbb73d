use async_trait::async_trait;

use crate::error::HostServiceResult;
use crate::method::HostMethod;

/// Transport to the privileged host service.
///
/// One request/response round trip. Implementations report a daemon-side
/// failure as [`HostServiceError::Call`](crate::HostServiceError::Call)
/// carrying the daemon's message verbatim; timeouts are applied by
/// [`HostServiceClient`](crate::HostServiceClient), not here.
#[async_trait]
pub trait HostServiceCaller: Send + Sync {
    async fn call(&self, method: &HostMethod, payload: &str) -> HostServiceResult<String>;
}
