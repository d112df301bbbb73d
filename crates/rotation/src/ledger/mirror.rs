use async_trait::async_trait;
use rotor_statedb::{KvStore, StateKey};
use std::marker::PhantomData;
use std::sync::Arc;

use super::FreshnessLedger;
use crate::error::LedgerResult;

/// One state-DB hash derived from a ledger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorEntry {
    pub key: StateKey,
    pub fields: Vec<(String, String)>,
}

/// Maps a ledger record onto the state-DB hashes that expose it.
pub type Projection<R> = fn(&R) -> Vec<MirrorEntry>;

/// Ledger wrapper that republishes every saved record to the state DB.
///
/// The state DB is a read-only projection for operators: a mirror write
/// failure is logged and does not fail the save.
pub struct MirroredLedger<L, R> {
    inner: L,
    kv: Arc<dyn KvStore>,
    projection: Projection<R>,
    _record: PhantomData<fn() -> R>,
}

impl<L, R> MirroredLedger<L, R>
where
    L: FreshnessLedger<R>,
    R: Send + Sync,
{
    pub fn new(inner: L, kv: Arc<dyn KvStore>, projection: Projection<R>) -> Self {
        Self {
            inner,
            kv,
            projection,
            _record: PhantomData,
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Publish `record`. Returns the number of entries written.
    pub async fn mirror(&self, record: &R) -> usize {
        let mut written = 0;
        for entry in (self.projection)(record) {
            match self.kv.hset(entry.key.as_str(), &entry.fields).await {
                Ok(()) => written += 1,
                Err(e) => {
                    tracing::warn!(key = %entry.key, error = %e, "failed to mirror freshness record");
                }
            }
        }
        written
    }

    /// Load the committed record and publish it. Used at startup so the
    /// state DB reflects the ledger after a restart.
    pub async fn mirror_current(&self) -> LedgerResult<R> {
        let record = self.inner.load().await?;
        self.mirror(&record).await;
        Ok(record)
    }
}

#[async_trait]
impl<L, R> FreshnessLedger<R> for MirroredLedger<L, R>
where
    L: FreshnessLedger<R>,
    R: Send + Sync,
{
    async fn load(&self) -> LedgerResult<R> {
        self.inner.load().await
    }

    async fn save(&self, record: &R) -> LedgerResult<()> {
        self.inner.save(record).await?;
        self.mirror(record).await;
        Ok(())
    }
}

/// State-DB layouts for each kind.
pub mod projection {
    use super::MirrorEntry;
    use crate::ledger::{ConsoleDocument, SshAccountsDocument, SshHostDocument};
    use rotor_core::FreshnessRecord;
    use rotor_statedb::StateKey;

    fn pair(
        version_field: &str,
        created_on_field: &str,
        record: &FreshnessRecord,
    ) -> [(String, String); 2] {
        [
            (version_field.to_string(), record.version.clone()),
            (created_on_field.to_string(), record.created_on.to_string()),
        ]
    }

    /// `AUTHZ_POLICY|p4rt` and `AUTHZ_POLICY|gnxi`.
    pub fn authz(record: &FreshnessRecord) -> Vec<MirrorEntry> {
        ["p4rt", "gnxi"]
            .into_iter()
            .map(|instance| MirrorEntry {
                key: StateKey::new("AUTHZ_POLICY").with_key(instance),
                fields: pair("authz_version", "authz_created_on", record).to_vec(),
            })
            .collect()
    }

    /// `PATHZ_POLICY|ACTIVE`.
    pub fn pathz(record: &FreshnessRecord) -> Vec<MirrorEntry> {
        vec![MirrorEntry {
            key: StateKey::new("PATHZ_POLICY").with_key("ACTIVE"),
            fields: pair("pathz_version", "pathz_created_on", record).to_vec(),
        }]
    }

    /// `SSH_ACCOUNT|<account>` per account.
    pub fn ssh_accounts(doc: &SshAccountsDocument) -> Vec<MirrorEntry> {
        doc.accounts
            .iter()
            .map(|(account, record)| {
                let mut fields = pair("keys_version", "keys_created_on", &record.keys).to_vec();
                fields.extend(pair(
                    "principals_version",
                    "principals_created_on",
                    &record.principals,
                ));
                MirrorEntry {
                    key: StateKey::new("SSH_ACCOUNT").with_key(account),
                    fields,
                }
            })
            .collect()
    }

    /// `SSH_HOST`.
    pub fn ssh_host(doc: &SshHostDocument) -> Vec<MirrorEntry> {
        vec![MirrorEntry {
            key: StateKey::new("SSH_HOST"),
            fields: pair("ca_keys_version", "ca_keys_created_on", &doc.ca_keys).to_vec(),
        }]
    }

    /// `CONSOLE_ACCOUNT|<account>` per account.
    pub fn console(doc: &ConsoleDocument) -> Vec<MirrorEntry> {
        doc.accounts
            .iter()
            .map(|(account, record)| MirrorEntry {
                key: StateKey::new("CONSOLE_ACCOUNT").with_key(account),
                fields: pair("password_version", "password_created_on", record).to_vec(),
            })
            .collect()
    }
}
