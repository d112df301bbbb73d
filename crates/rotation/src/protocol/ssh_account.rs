use rotor_core::{FreshnessRecord, ResourceKind};
use rotor_hostsvc::payload::{self, AccountKeys, AccountUsers, KeyLine, LineOption, PrincipalLine};

use super::{Inbound, RotationProtocol};
use crate::error::{ValidationError, ValidationResult};
use crate::ledger::SshAccountsDocument;
use crate::messages::{
    AuthorizedKeysRequest, AuthorizedUsersRequest, KeyOption, RotateAccountCredentialsRequest,
    RotateAccountCredentialsResponse,
};
use crate::store::HostPayload;
use crate::validate;

/// Authorized keys or authorized principals for a set of accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshAccountChange {
    Keys(AuthorizedKeysRequest),
    Principals(AuthorizedUsersRequest),
}

fn options(options: &[KeyOption]) -> Vec<LineOption> {
    options
        .iter()
        .map(|o| LineOption {
            name: o.name.clone(),
            value: o.value.clone(),
        })
        .collect()
}

impl HostPayload for SshAccountChange {
    fn payload(&self) -> String {
        match self {
            Self::Keys(request) => {
                let accounts: Vec<AccountKeys> = request
                    .credentials
                    .iter()
                    .map(|entry| AccountKeys {
                        account: entry.account.clone(),
                        keys: entry
                            .authorized_keys
                            .iter()
                            .map(|k| KeyLine {
                                key: payload::key_line(
                                    k.key_type.ssh_prefix(),
                                    &k.authorized_key,
                                    &k.description,
                                ),
                                options: options(&k.options),
                            })
                            .collect(),
                    })
                    .collect();
                payload::ssh_account_keys(&accounts)
            }
            Self::Principals(request) => {
                let accounts: Vec<AccountUsers> = request
                    .policies
                    .iter()
                    .map(|entry| AccountUsers {
                        account: entry.account.clone(),
                        users: entry
                            .authorized_principals
                            .iter()
                            .map(|p| PrincipalLine {
                                name: p.authorized_user.clone(),
                                options: options(&p.options),
                            })
                            .collect(),
                    })
                    .collect();
                payload::ssh_account_users(&accounts)
            }
        }
    }
}

/// Per-account SSH keys and principals; both may appear in one session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshAccountProtocol;

impl RotationProtocol for SshAccountProtocol {
    type Request = RotateAccountCredentialsRequest;
    type Response = RotateAccountCredentialsResponse;
    type Change = SshAccountChange;
    type Record = SshAccountsDocument;

    fn kind(&self) -> ResourceKind {
        ResourceKind::SshAccountCredential
    }

    fn classify(
        &self,
        request: RotateAccountCredentialsRequest,
        _staged: usize,
    ) -> ValidationResult<Inbound<SshAccountChange>> {
        match request {
            RotateAccountCredentialsRequest::Credential(keys) => {
                Ok(Inbound::Upload(SshAccountChange::Keys(keys)))
            }
            RotateAccountCredentialsRequest::User(users) => {
                Ok(Inbound::Upload(SshAccountChange::Principals(users)))
            }
            RotateAccountCredentialsRequest::Finalize => Ok(Inbound::Finalize),
            RotateAccountCredentialsRequest::Password(_) => Err(ValidationError::conflict(
                "Password cannot be rotated in an SSH credential session",
            )),
        }
    }

    fn validate(&self, change: &SshAccountChange) -> ValidationResult<()> {
        match change {
            SshAccountChange::Keys(request) => validate::authorized_keys(request),
            SshAccountChange::Principals(request) => validate::authorized_users(request),
        }
    }

    fn record(&self, record: &mut SshAccountsDocument, change: &SshAccountChange) {
        match change {
            SshAccountChange::Keys(request) => {
                for entry in &request.credentials {
                    record.accounts.entry(entry.account.clone()).or_default().keys =
                        FreshnessRecord::new(entry.version.clone(), entry.created_on);
                }
            }
            SshAccountChange::Principals(request) => {
                for entry in &request.policies {
                    record.accounts.entry(entry.account.clone()).or_default().principals =
                        FreshnessRecord::new(entry.version.clone(), entry.created_on);
                }
            }
        }
    }

    fn ack(&self, change: &SshAccountChange) -> RotateAccountCredentialsResponse {
        match change {
            SshAccountChange::Keys(_) => RotateAccountCredentialsResponse::Credential,
            SshAccountChange::Principals(_) => RotateAccountCredentialsResponse::User,
        }
    }
}
