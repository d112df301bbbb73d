use rotor_core::{FreshnessRecord, ResourceKind};
use rotor_hostsvc::payload::{self, ConsolePassword};

use super::{Inbound, RotationProtocol};
use crate::error::{ValidationError, ValidationResult};
use crate::ledger::ConsoleDocument;
use crate::messages::{
    Password, PasswordRequest, RotateAccountCredentialsRequest, RotateAccountCredentialsResponse,
};
use crate::store::HostPayload;
use crate::validate;

impl HostPayload for PasswordRequest {
    fn payload(&self) -> String {
        let accounts: Vec<ConsolePassword> = self
            .accounts
            .iter()
            .map(|entry| ConsolePassword {
                name: entry.account.clone(),
                password: match &entry.password {
                    Some(Password::Plaintext(p)) => p.clone(),
                    _ => String::new(),
                },
            })
            .collect();
        payload::console_passwords(&accounts)
    }
}

/// Console account passwords.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProtocol;

impl RotationProtocol for ConsoleProtocol {
    type Request = RotateAccountCredentialsRequest;
    type Response = RotateAccountCredentialsResponse;
    type Change = PasswordRequest;
    type Record = ConsoleDocument;

    fn kind(&self) -> ResourceKind {
        ResourceKind::ConsoleCredential
    }

    fn classify(
        &self,
        request: RotateAccountCredentialsRequest,
        _staged: usize,
    ) -> ValidationResult<Inbound<PasswordRequest>> {
        match request {
            RotateAccountCredentialsRequest::Password(passwords) => Ok(Inbound::Upload(passwords)),
            RotateAccountCredentialsRequest::Finalize => Ok(Inbound::Finalize),
            other => Err(ValidationError::conflict(format!(
                "{} cannot be rotated in a console password session",
                other.name()
            ))),
        }
    }

    fn validate(&self, change: &PasswordRequest) -> ValidationResult<()> {
        validate::console_passwords(change)
    }

    fn record(&self, record: &mut ConsoleDocument, change: &PasswordRequest) {
        for entry in &change.accounts {
            record.accounts.insert(
                entry.account.clone(),
                FreshnessRecord::new(entry.version.clone(), entry.created_on),
            );
        }
    }

    fn ack(&self, _change: &PasswordRequest) -> RotateAccountCredentialsResponse {
        RotateAccountCredentialsResponse::Password
    }
}
