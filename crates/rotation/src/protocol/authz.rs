use rotor_core::{FreshnessRecord, ResourceKind};

use super::{Inbound, RotationProtocol, duplicate_version};
use crate::error::{ValidationError, ValidationResult};
use crate::messages::{AuthzRequest, RotateAuthzRequest, RotateAuthzResponse, UploadRequest};
use crate::validate;

/// One authz policy upload.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthzChange {
    pub version: String,
    pub created_on: u64,
    pub policy: String,
    pub force: bool,
}

impl std::fmt::Debug for AuthzChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthzChange")
            .field("version", &self.version)
            .field("created_on", &self.created_on)
            .field("policy_len", &self.policy.len())
            .field("force", &self.force)
            .finish()
    }
}

/// gRPC authorization policy. A bare Finalize commits nothing and succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthzProtocol;

impl RotationProtocol for AuthzProtocol {
    type Request = RotateAuthzRequest;
    type Response = RotateAuthzResponse;
    type Change = AuthzChange;
    type Record = FreshnessRecord;

    fn kind(&self) -> ResourceKind {
        ResourceKind::AuthzPolicy
    }

    fn classify(
        &self,
        request: RotateAuthzRequest,
        _staged: usize,
    ) -> ValidationResult<Inbound<AuthzChange>> {
        match request.request {
            Some(AuthzRequest::Upload(UploadRequest {
                version,
                created_on,
                policy,
            })) => Ok(Inbound::Upload(AuthzChange {
                version,
                created_on,
                policy,
                force: request.force_overwrite,
            })),
            Some(AuthzRequest::Finalize) => Ok(Inbound::Finalize),
            None => Err(ValidationError::malformed("Unknown request")),
        }
    }

    fn validate(&self, change: &AuthzChange) -> ValidationResult<()> {
        validate::authz_upload(&change.version, &change.policy)
    }

    fn already_committed(&self, committed: &FreshnessRecord, change: &AuthzChange) -> Option<String> {
        duplicate_version("Authz", committed, &change.version, change.force)
    }

    fn record(&self, record: &mut FreshnessRecord, change: &AuthzChange) {
        *record = FreshnessRecord::new(change.version.clone(), change.created_on);
    }

    fn ack(&self, _change: &AuthzChange) -> RotateAuthzResponse {
        RotateAuthzResponse::default()
    }
}
