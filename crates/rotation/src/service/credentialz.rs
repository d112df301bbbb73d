use rotor_core::Status;
use std::sync::Arc;

use super::{authenticate, unimplemented};
use crate::auth::Authenticator;
use crate::engine::{Engine, NO_FINALIZE};
use crate::messages::{
    CanGenerateKeyRequest, CanGenerateKeyResponse, GetPublicKeysRequest, GetPublicKeysResponse,
    RotateAccountCredentialsRequest, RotateAccountCredentialsResponse,
    RotateHostParametersRequest, RotateHostParametersResponse,
};
use crate::protocol::{ConsoleProtocol, GlomeProtocol, SshAccountProtocol, SshHostProtocol};
use crate::store::{HostServiceStore, SigningConfigStore};
use crate::stream::RotateStream;

/// Status message for a host-parameter stream that opens with Finalize.
pub const FINALIZE_FIRST: &str = "Finalize cannot be the first message in a transaction.";

/// gNSI `credentialz` service.
///
/// Each Rotate RPC carries several resource kinds. The first message picks
/// the kind, and the rest of the stream belongs to that kind's engine.
pub struct CredentialzService {
    ssh_account: Engine<SshAccountProtocol, HostServiceStore>,
    console: Engine<ConsoleProtocol, HostServiceStore>,
    ssh_host: Engine<SshHostProtocol, HostServiceStore>,
    glome: Engine<GlomeProtocol, SigningConfigStore>,
    authenticator: Arc<dyn Authenticator>,
}

/// The message that decides which engine serves the stream.
fn opening<Req>(next: Option<Result<Req, Status>>) -> Result<Req, Status> {
    match next {
        Some(Ok(request)) => Ok(request),
        Some(Err(status)) => Err(Status::aborted(status.message())),
        None => Err(Status::aborted(NO_FINALIZE)),
    }
}

impl CredentialzService {
    pub fn new(
        ssh_account: Engine<SshAccountProtocol, HostServiceStore>,
        console: Engine<ConsoleProtocol, HostServiceStore>,
        ssh_host: Engine<SshHostProtocol, HostServiceStore>,
        glome: Engine<GlomeProtocol, SigningConfigStore>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            ssh_account,
            console,
            ssh_host,
            glome,
            authenticator,
        }
    }

    /// SSH authorized keys and principals, or console passwords.
    ///
    /// A stream that opens with Finalize has nothing to commit and succeeds.
    pub async fn rotate_account_credentials<St>(&self, stream: &mut St) -> Result<(), Status>
    where
        St: RotateStream<RotateAccountCredentialsRequest, RotateAccountCredentialsResponse>
            + ?Sized,
    {
        let context = stream.context().clone();
        authenticate(
            self.authenticator.as_ref(),
            &context,
            "credentialz.RotateAccountCredentials",
        )
        .await?;

        let first = opening(stream.recv().await)?;
        match first {
            RotateAccountCredentialsRequest::Credential(_) | RotateAccountCredentialsRequest::User(_) => {
                self.ssh_account.run(stream, Some(first)).await
            }
            RotateAccountCredentialsRequest::Password(_) => self.console.run(stream, Some(first)).await,
            RotateAccountCredentialsRequest::Finalize => {
                tracing::debug!("account credential stream finalized with nothing staged");
                Ok(())
            }
        }
    }

    /// Trusted SSH CA keys or the GLOME config. Server key generation and
    /// the policy-check messages are not supported.
    pub async fn rotate_host_parameters<St>(&self, stream: &mut St) -> Result<(), Status>
    where
        St: RotateStream<RotateHostParametersRequest, RotateHostParametersResponse> + ?Sized,
    {
        let context = stream.context().clone();
        authenticate(
            self.authenticator.as_ref(),
            &context,
            "credentialz.RotateHostParameters",
        )
        .await?;

        let first = opening(stream.recv().await)?;
        match first {
            RotateHostParametersRequest::SshCaPublicKey(_) => self.ssh_host.run(stream, Some(first)).await,
            RotateHostParametersRequest::Glome(_) => self.glome.run(stream, Some(first)).await,
            RotateHostParametersRequest::Finalize => Err(Status::aborted(FINALIZE_FIRST)),
            other => {
                tracing::warn!(message = other.name(), "unsupported host parameter");
                Err(Status::unimplemented(format!("{} Unimplemented", other.name())))
            }
        }
    }

    pub async fn can_generate_key(
        &self,
        _request: CanGenerateKeyRequest,
    ) -> Result<CanGenerateKeyResponse, Status> {
        Err(unimplemented("CanGenerateKey"))
    }

    pub async fn get_public_keys(
        &self,
        _request: GetPublicKeysRequest,
    ) -> Result<GetPublicKeysResponse, Status> {
        Err(unimplemented("GetPublicKeys"))
    }

    pub fn ssh_account(&self) -> &Engine<SshAccountProtocol, HostServiceStore> {
        &self.ssh_account
    }

    pub fn console(&self) -> &Engine<ConsoleProtocol, HostServiceStore> {
        &self.console
    }

    pub fn ssh_host(&self) -> &Engine<SshHostProtocol, HostServiceStore> {
        &self.ssh_host
    }

    pub fn glome(&self) -> &Engine<GlomeProtocol, SigningConfigStore> {
        &self.glome
    }
}
