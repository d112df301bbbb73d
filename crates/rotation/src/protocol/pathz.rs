use rotor_core::{FreshnessRecord, ResourceKind};
use rotor_pathz::AuthorizationPolicy;

use super::{Inbound, RotationProtocol, duplicate_version, require_upload};
use crate::error::{ValidationError, ValidationResult};
use crate::messages::{PathzRequest, PathzUpload, RotatePathzRequest, RotatePathzResponse};
use crate::validate;

/// One pathz policy upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathzChange {
    pub version: String,
    pub created_on: u64,
    pub policy: AuthorizationPolicy,
    pub force: bool,
}

/// Path-based gNMI ACL. Finalize needs a prior upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathzProtocol;

impl RotationProtocol for PathzProtocol {
    type Request = RotatePathzRequest;
    type Response = RotatePathzResponse;
    type Change = PathzChange;
    type Record = FreshnessRecord;

    fn kind(&self) -> ResourceKind {
        ResourceKind::PathzPolicy
    }

    fn classify(
        &self,
        request: RotatePathzRequest,
        _staged: usize,
    ) -> ValidationResult<Inbound<PathzChange>> {
        match request.request {
            Some(PathzRequest::Upload(PathzUpload {
                version,
                created_on,
                policy,
            })) => Ok(Inbound::Upload(PathzChange {
                version,
                created_on,
                policy,
                force: request.force_overwrite,
            })),
            Some(PathzRequest::Finalize) => Ok(Inbound::Finalize),
            None => Err(ValidationError::malformed("Unknown request")),
        }
    }

    fn validate(&self, change: &PathzChange) -> ValidationResult<()> {
        validate::pathz_upload(&change.version, &change.policy)
    }

    fn already_committed(&self, committed: &FreshnessRecord, change: &PathzChange) -> Option<String> {
        duplicate_version("Pathz", committed, &change.version, change.force)
    }

    fn can_finalize(&self, staged: usize) -> ValidationResult<()> {
        require_upload(staged)
    }

    fn record(&self, record: &mut FreshnessRecord, change: &PathzChange) {
        *record = FreshnessRecord::new(change.version.clone(), change.created_on);
    }

    fn ack(&self, _change: &PathzChange) -> RotatePathzResponse {
        RotatePathzResponse::default()
    }
}
