use rotor_core::Status;
use std::sync::Arc;

use super::{authenticate, unimplemented};
use crate::auth::Authenticator;
use crate::engine::Engine;
use crate::messages::{
    GetRequest, GetResponse, ProbeRequest, ProbeResponse, RotateAuthzRequest, RotateAuthzResponse,
};
use crate::protocol::AuthzProtocol;
use crate::store::FilePolicyStore;
use crate::stream::RotateStream;

/// gNSI `authz` service.
pub struct AuthzService {
    engine: Engine<AuthzProtocol, FilePolicyStore>,
    authenticator: Arc<dyn Authenticator>,
}

impl AuthzService {
    pub fn new(
        engine: Engine<AuthzProtocol, FilePolicyStore>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            engine,
            authenticator,
        }
    }

    pub fn engine(&self) -> &Engine<AuthzProtocol, FilePolicyStore> {
        &self.engine
    }

    pub async fn rotate<St>(&self, stream: &mut St) -> Result<(), Status>
    where
        St: RotateStream<RotateAuthzRequest, RotateAuthzResponse> + ?Sized,
    {
        let context = stream.context().clone();
        authenticate(self.authenticator.as_ref(), &context, "authz.Rotate").await?;
        self.engine.run(stream, None).await
    }

    pub async fn probe(&self, _request: ProbeRequest) -> Result<ProbeResponse, Status> {
        Err(unimplemented("Probe"))
    }

    pub async fn get(&self, _request: GetRequest) -> Result<GetResponse, Status> {
        Err(unimplemented("Get"))
    }
}
