use rotor_core::Status;
use std::sync::Arc;

use super::{authenticate, unimplemented};
use crate::auth::Authenticator;
use crate::engine::Engine;
use crate::messages::{
    GetRequest, GetResponse, ProbeRequest, ProbeResponse, RotatePathzRequest, RotatePathzResponse,
};
use crate::protocol::PathzProtocol;
use crate::store::PathzStore;
use crate::stream::RotateStream;

/// gNSI `pathz` service.
pub struct PathzService {
    engine: Engine<PathzProtocol, PathzStore>,
    authenticator: Arc<dyn Authenticator>,
}

impl PathzService {
    pub fn new(engine: Engine<PathzProtocol, PathzStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            engine,
            authenticator,
        }
    }

    pub fn engine(&self) -> &Engine<PathzProtocol, PathzStore> {
        &self.engine
    }

    pub async fn rotate<St>(&self, stream: &mut St) -> Result<(), Status>
    where
        St: RotateStream<RotatePathzRequest, RotatePathzResponse> + ?Sized,
    {
        let context = stream.context().clone();
        authenticate(self.authenticator.as_ref(), &context, "pathz.Rotate").await?;
        self.engine.run(stream, None).await
    }

    pub async fn probe(&self, _request: ProbeRequest) -> Result<ProbeResponse, Status> {
        Err(unimplemented("Probe"))
    }

    pub async fn get(&self, _request: GetRequest) -> Result<GetResponse, Status> {
        Err(unimplemented("Get"))
    }
}
