//! RPC handlers: one per gNSI service, each a thin shell over its engines.
//!
//! Every Rotate call authenticates first. Nothing else, including the
//! session guard, is touched for a caller that fails authentication.

mod authz;
mod credentialz;
mod pathz;

pub use authz::AuthzService;
pub use credentialz::{CredentialzService, FINALIZE_FIRST};
pub use pathz::PathzService;

use rotor_core::Status;

use crate::auth::{Authenticator, Identity, ROTATE_RESOURCE_CLASS};
use crate::stream::CallContext;

async fn authenticate(
    authenticator: &dyn Authenticator,
    context: &CallContext,
    rpc: &'static str,
) -> Result<Identity, Status> {
    let identity = authenticator
        .authenticate(context, ROTATE_RESOURCE_CLASS, false)
        .await
        .inspect_err(|status| {
            tracing::warn!(rpc, peer = ?context.peer, code = %status.code(), "authentication failed");
        })?;
    tracing::debug!(rpc, user = %identity.username, "caller authenticated");
    Ok(identity)
}

fn unimplemented(method: &str) -> Status {
    Status::unimplemented(format!("method {method} not implemented"))
}
