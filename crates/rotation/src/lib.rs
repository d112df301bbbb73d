//! # Rotor Rotation
//!
//! Transactional rotation of device security configuration over gNSI
//! Rotate RPCs.
//!
//! A Rotate call is a bidirectional stream: the client uploads one or more
//! new artefacts, each acknowledged once staged, then sends `Finalize`.
//! Anything short of `Finalize` (an invalid upload, a storage error, the
//! client disconnecting) puts the device back exactly as it was.
//!
//! ## Architecture
//!
//! - [`engine::Engine`] drives one session through checkpoint, stage and
//!   commit or rollback. It is generic over a [`protocol::RotationProtocol`]
//!   (message classification and validation for one resource kind) and a
//!   [`store::BackingStore`] (where that kind lives).
//! - [`guard::GuardRegistry`] allows at most one session per resource kind.
//! - [`ledger`] keeps the committed `{version, created_on}` per kind and
//!   mirrors it into the state DB.
//! - [`service`] holds the gNSI handlers: `authz`, `pathz` and
//!   `credentialz`.
//! - [`server::RotorServer`] wires all of the above from a
//!   [`config::ServerConfig`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rotor_rotation::prelude::*;
//!
//! let server = RotorServer::builder()
//!     .config(ServerConfig::from_file("/etc/rotor.toml")?)
//!     .host_service(caller)
//!     .state_db(kv)
//!     .authenticator(authenticator)
//!     .build()
//!     .await?;
//!
//! server.authz().rotate(&mut stream).await?;
//! ```

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
mod fs;
pub mod guard;
pub mod ledger;
pub mod messages;
pub mod protocol;
pub mod server;
pub mod service;
pub mod session;
pub mod store;
pub mod stream;
pub mod validate;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use auth::{Authenticator, Identity};
pub use config::ServerConfig;
pub use engine::Engine;
pub use error::{ConfigError, LedgerError, ServerError, StoreError, ValidationError};
pub use guard::{GuardRegistry, SessionGuard};
pub use server::{RotorServer, RotorServerBuilder};
pub use service::{AuthzService, CredentialzService, PathzService};
pub use session::{RotationSession, SessionPhase};
pub use stream::{CallContext, RotateStream};

/// Common imports for embedding the rotation services.
pub mod prelude {
    pub use crate::auth::{Authenticator, Identity};
    pub use crate::config::ServerConfig;
    pub use crate::error::ServerError;
    pub use crate::server::{RotorServer, RotorServerBuilder};
    pub use crate::service::{AuthzService, CredentialzService, PathzService};
    pub use crate::stream::{CallContext, RotateStream};
    pub use rotor_core::{Code, ResourceKind, Status};
}
