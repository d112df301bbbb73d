use chrono::Utc;
use rotor_core::{ResourceKind, SigningConfigRecord};

use super::ssh_host::expected_finalize;
use super::{Inbound, RotationProtocol, require_upload};
use crate::error::ValidationResult;
use crate::messages::{GlomeRequest, RotateHostParametersRequest, RotateHostParametersResponse};
use crate::validate;

/// GLOME URL-signing config. Exactly one config message, then Finalize.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlomeProtocol;

impl RotationProtocol for GlomeProtocol {
    type Request = RotateHostParametersRequest;
    type Response = RotateHostParametersResponse;
    type Change = GlomeRequest;
    type Record = SigningConfigRecord;

    fn kind(&self) -> ResourceKind {
        ResourceKind::UrlSigningConfig
    }

    fn classify(
        &self,
        request: RotateHostParametersRequest,
        staged: usize,
    ) -> ValidationResult<Inbound<GlomeRequest>> {
        match request {
            RotateHostParametersRequest::Finalize => Ok(Inbound::Finalize),
            RotateHostParametersRequest::Glome(config) if staged == 0 => Ok(Inbound::Upload(config)),
            other => Err(expected_finalize(&other)),
        }
    }

    fn validate(&self, change: &GlomeRequest) -> ValidationResult<()> {
        validate::glome(change)
    }

    fn can_finalize(&self, staged: usize) -> ValidationResult<()> {
        require_upload(staged)
    }

    fn record(&self, record: &mut SigningConfigRecord, change: &GlomeRequest) {
        record.enabled = change.enabled;
        record.key_version = u32::try_from(change.key_version).unwrap_or_default();
        record.last_updated = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    }

    fn ack(&self, _change: &GlomeRequest) -> RotateHostParametersResponse {
        RotateHostParametersResponse::Glome
    }
}
