//! # Rotor Host Service
//!
//! Client side of the privileged host service: the daemon that owns the
//! switch's SSH, console and GLOME configuration and applies changes on our
//! behalf.
//!
//! Every request is a `(method, payload)` pair. Methods are namespaced per
//! backend service (`org.SONiC.HostService.ssh_mgmt.set`, ...); payloads are
//! JSON strings whose exact shape the daemon parses by hand, so the builders
//! in [`payload`] reproduce it byte for byte.
//!
//! The transport itself is behind [`HostServiceCaller`]; this crate adds
//! per-call timeouts, checkpoint bookkeeping and counters on top.

mod caller;
mod client;
mod error;
mod method;
mod metrics;
pub mod payload;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use caller::HostServiceCaller;
pub use client::{CheckpointToken, ClientConfig, HostServiceClient};
pub use error::{HostServiceError, HostServiceResult};
pub use method::{HostAction, HostMethod, HostService, NAME_PREFIX, PATH_PREFIX};
pub use metrics::HostServiceMetrics;
