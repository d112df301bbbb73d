//! Test fixtures: a fully wired server over in-process collaborators.

use rotor_hostsvc::testing::FakeHostService;
use rotor_statedb::MemoryKvStore;
use std::path::Path;
use std::sync::Arc;

use crate::auth::{AllowAll, Authenticator};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::server::RotorServer;
use crate::stream::{CallContext, ChannelStream, ClientHandle, channel_stream};

pub use crate::auth::DenyAll;
pub use crate::ledger::MemoryLedger;
pub use rotor_hostsvc::testing::RecordedCall;

/// Server whose files live in one directory, with a fake host service and
/// an in-memory state DB.
pub struct Harness {
    pub config: ServerConfig,
    pub host: Arc<FakeHostService>,
    pub kv: MemoryKvStore,
    pub server: RotorServer,
}

impl Harness {
    /// Server that accepts every caller.
    pub async fn start(dir: &Path) -> Result<Self, ServerError> {
        Self::start_with(ServerConfig::rooted_at(dir), Arc::new(AllowAll)).await
    }

    pub async fn start_with(
        config: ServerConfig,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self, ServerError> {
        let host = Arc::new(FakeHostService::new());
        let kv = MemoryKvStore::new();
        let server = RotorServer::builder()
            .config(config.clone())
            .host_service(Arc::clone(&host) as _)
            .state_db(Arc::new(kv.clone()))
            .authenticator(authenticator)
            .build()
            .await?;
        Ok(Self {
            config,
            host,
            kv,
            server,
        })
    }
}

/// Stream pair for one Rotate call from a fixed test peer.
pub fn rotate_call<Req, Resp>() -> (ChannelStream<Req, Resp>, ClientHandle<Req, Resp>) {
    channel_stream(CallContext::default().with_peer("test-client"))
}
