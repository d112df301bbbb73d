//! Backing stores: where a rotated resource actually lives.
//!
//! Every store speaks the same four-step transaction. The engine guarantees
//! the call order `checkpoint`, any number of `apply`, then exactly one of
//! `commit` or `rollback` with the token `checkpoint` returned.

mod file;
mod host;
mod pathz;
mod signing;

pub use file::{FileCheckpoint, FilePolicyStore};
pub use host::{HostPayload, HostServiceStore};
pub use pathz::{PathzCheckpoint, PathzStore};
pub use signing::SigningConfigStore;

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::StoreResult;

/// Checkpointed mutable state for one resource kind.
#[async_trait]
pub trait BackingStore<C>: Send + Sync
where
    C: Send + Sync,
{
    /// Handle to the saved pre-session state.
    type Token: Debug + Send + Sync;

    /// Save the current state. Fails if a checkpoint is already held.
    async fn checkpoint(&self) -> StoreResult<Self::Token>;

    /// Make `change` the live state.
    async fn apply(&self, change: &C) -> StoreResult<()>;

    /// Keep the applied state and discard the checkpoint.
    async fn commit(&self, token: &Self::Token) -> StoreResult<()>;

    /// Put the checkpointed state back and discard the checkpoint.
    async fn rollback(&self, token: &Self::Token) -> StoreResult<()>;
}
