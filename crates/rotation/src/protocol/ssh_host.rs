use rotor_core::{FreshnessRecord, ResourceKind};
use rotor_hostsvc::payload;

use super::{Inbound, RotationProtocol};
use crate::error::{ValidationError, ValidationResult};
use crate::ledger::SshHostDocument;
use crate::messages::{
    CaPublicKeyRequest, RotateHostParametersRequest, RotateHostParametersResponse,
};
use crate::store::HostPayload;
use crate::validate;

impl HostPayload for CaPublicKeyRequest {
    fn payload(&self) -> String {
        let keys: Vec<String> = self
            .ssh_ca_public_keys
            .iter()
            .map(|k| payload::key_line(k.key_type.ssh_prefix(), &k.public_key, &k.description))
            .collect();
        payload::ssh_ca_public_keys(&keys)
    }
}

/// Message returned for anything but Finalize once a host parameter is staged.
pub(crate) fn expected_finalize(request: &RotateHostParametersRequest) -> ValidationError {
    ValidationError::conflict(format!(
        "Expected Finalize message, but received {}",
        request.name()
    ))
}

/// Trusted SSH CA keys. One upload per session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshHostProtocol;

impl RotationProtocol for SshHostProtocol {
    type Request = RotateHostParametersRequest;
    type Response = RotateHostParametersResponse;
    type Change = CaPublicKeyRequest;
    type Record = SshHostDocument;

    fn kind(&self) -> ResourceKind {
        ResourceKind::SshHostParameter
    }

    fn classify(
        &self,
        request: RotateHostParametersRequest,
        staged: usize,
    ) -> ValidationResult<Inbound<CaPublicKeyRequest>> {
        match request {
            RotateHostParametersRequest::Finalize => Ok(Inbound::Finalize),
            RotateHostParametersRequest::SshCaPublicKey(keys) if staged == 0 => {
                Ok(Inbound::Upload(keys))
            }
            other => Err(expected_finalize(&other)),
        }
    }

    fn validate(&self, change: &CaPublicKeyRequest) -> ValidationResult<()> {
        validate::ca_public_keys(change)
    }

    fn record(&self, record: &mut SshHostDocument, change: &CaPublicKeyRequest) {
        record.ca_keys = FreshnessRecord::new(change.version.clone(), change.created_on);
    }

    fn ack(&self, _change: &CaPublicKeyRequest) -> RotateHostParametersResponse {
        RotateHostParametersResponse::SshCaPublicKey
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{KeyType, PublicKey};
    use pretty_assertions::assert_eq;

    fn request() -> CaPublicKeyRequest {
        CaPublicKeyRequest {
            ssh_ca_public_keys: vec![
                PublicKey {
                    public_key: b"ca1".to_vec(),
                    key_type: KeyType::Rsa4096,
                    description: "root".into(),
                },
                PublicKey {
                    public_key: b"ca2".to_vec(),
                    key_type: KeyType::EcdsaP256,
                    description: "backup".into(),
                },
            ],
            version: "ca-v1".into(),
            created_on: 11,
        }
    }

    #[test]
    fn payload_lists_key_lines() {
        assert_eq!(
            request().payload(),
            r#"{ "SshCaPublicKey": [ "ssh-rsa Y2Ex root", "ecdsa-sha2-nistp256 Y2Ey backup" ] }"#
        );
    }

    #[test]
    fn second_upload_is_rejected() {
        let err = SshHostProtocol
            .classify(RotateHostParametersRequest::SshCaPublicKey(request()), 1)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::conflict("Expected Finalize message, but received SshCaPublicKey")
        );
    }

    #[test]
    fn glome_mid_session_is_rejected() {
        let err = SshHostProtocol
            .classify(RotateHostParametersRequest::Glome(Default::default()), 1)
            .unwrap_err();
        assert_eq!(err.to_string(), "Expected Finalize message, but received Glome");
    }
}
