//! Freshness ledgers: the committed `{version, created_on}` of each kind.
//!
//! A ledger is read when a session starts, for idempotency checks, and
//! written only after a successful commit. A ledger that has never been
//! written loads as the documented default.

mod file;
mod kv;
#[cfg(any(test, feature = "test-util"))]
mod memory;
mod mirror;

pub use file::FileLedger;
pub use kv::SigningConfigLedger;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryLedger;
pub use mirror::{MirrorEntry, MirroredLedger, Projection, projection};

use async_trait::async_trait;
use rotor_core::FreshnessRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::LedgerResult;

/// Durable store of one kind's committed freshness record.
#[async_trait]
pub trait FreshnessLedger<R>: Send + Sync
where
    R: Send + Sync,
{
    /// Current record, or the default if nothing was ever saved.
    async fn load(&self) -> LedgerResult<R>;

    async fn save(&self, record: &R) -> LedgerResult<()>;
}

/// Freshness of one SSH account's keys and principals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshAccountRecord {
    #[serde(default)]
    pub keys: FreshnessRecord,
    #[serde(default)]
    pub principals: FreshnessRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshAccountsDocument {
    #[serde(default)]
    pub accounts: BTreeMap<String, SshAccountRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshHostDocument {
    #[serde(default)]
    pub ca_keys: FreshnessRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleDocument {
    #[serde(default)]
    pub accounts: BTreeMap<String, FreshnessRecord>,
}
