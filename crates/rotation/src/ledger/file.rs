use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use super::FreshnessLedger;
use crate::error::{LedgerError, LedgerResult};
use crate::fs::atomic_write;

const LEDGER_MODE: u32 = 0o644;

/// JSON document on local disk.
#[derive(Debug, Clone)]
pub struct FileLedger<R> {
    path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R> FileLedger<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl<R> FreshnessLedger<R> for FileLedger<R>
where
    R: Serialize + DeserializeOwned + Default + Send + Sync + 'static,
{
    async fn load(&self) -> LedgerResult<R> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no ledger yet, using default");
                return Ok(R::default());
            }
            Err(source) => {
                return Err(LedgerError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| LedgerError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    async fn save(&self, record: &R) -> LedgerResult<()> {
        let mut data = serde_json::to_vec_pretty(record).map_err(|e| LedgerError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        data.push(b'\n');
        atomic_write(&self.path, &data, LEDGER_MODE)
            .await
            .map_err(|source| LedgerError::Write {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(path = %self.path.display(), "ledger saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ConsoleDocument, SshAccountRecord, SshAccountsDocument};
    use pretty_assertions::assert_eq;
    use rotor_core::FreshnessRecord;

    #[tokio::test]
    async fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::<FreshnessRecord>::new(dir.path().join("authz_meta.json"));
        let record = ledger.load().await.unwrap();
        assert_eq!(record, FreshnessRecord::new("unknown", 0));
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::<SshAccountsDocument>::new(dir.path().join("ssh_meta.json"));
        let mut doc = SshAccountsDocument::default();
        doc.accounts.insert(
            "admin".into(),
            SshAccountRecord {
                keys: FreshnessRecord::new("k1", 10),
                principals: FreshnessRecord::default(),
            },
        );

        ledger.save(&doc).await.unwrap();

        assert_eq!(ledger.load().await.unwrap(), doc);
    }

    #[tokio::test]
    async fn garbage_is_corrupt_not_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console_meta.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let ledger = FileLedger::<ConsoleDocument>::new(&path);

        let err = ledger.load().await.unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn partial_document_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ssh_meta.json");
        tokio::fs::write(&path, br#"{"accounts":{"admin":{"keys":{"version":"k2","created_on":5}}}}"#)
            .await
            .unwrap();
        let ledger = FileLedger::<SshAccountsDocument>::new(&path);

        let doc = ledger.load().await.unwrap();
        assert_eq!(doc.accounts["admin"].keys.version, "k2");
        assert!(doc.accounts["admin"].principals.is_unknown());
    }
}
