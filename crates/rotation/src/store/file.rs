use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::BackingStore;
use crate::error::{StoreError, StoreResult};
use crate::fs::atomic_write;
use crate::protocol::authz::AuthzChange;

const POLICY_MODE: u32 = 0o600;

/// Saved state of a [`FilePolicyStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCheckpoint {
    backup: PathBuf,
}

impl FileCheckpoint {
    pub fn backup(&self) -> &Path {
        &self.backup
    }
}

/// A policy document on local disk, checkpointed as a sibling backup file.
///
/// The active file must exist before a rotation; an install puts the first
/// policy in place.
#[derive(Debug, Clone)]
pub struct FilePolicyStore {
    path: PathBuf,
    backup: PathBuf,
}

impl FilePolicyStore {
    pub fn new(path: impl Into<PathBuf>, backup_suffix: &str) -> Self {
        let path = path.into();
        let mut backup = OsString::from(path.as_os_str());
        backup.push(backup_suffix);
        Self {
            path,
            backup: PathBuf::from(backup),
        }
    }

    /// Authz layout: `<file>.bak`.
    pub fn authz(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ".bak")
    }

    /// Pathz layout: `<file>.backup`.
    pub fn pathz(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ".backup")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    pub async fn take_checkpoint(&self) -> StoreResult<FileCheckpoint> {
        let stale = tokio::fs::try_exists(&self.backup)
            .await
            .map_err(|e| StoreError::io("stat", &self.backup, e))?;
        if stale {
            tracing::error!(backup = %self.backup.display(), "backup file already present");
            return Err(StoreError::CheckpointExists {
                path: self.backup.clone(),
            });
        }

        match tokio::fs::copy(&self.path, &self.backup).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(e) => return Err(StoreError::io("backup", &self.path, e)),
        }

        tracing::debug!(path = %self.path.display(), "policy file checkpointed");
        Ok(FileCheckpoint {
            backup: self.backup.clone(),
        })
    }

    /// Put back a backup left behind by a session that never finished,
    /// e.g. when the process died mid-rotation. Returns whether one was
    /// found.
    pub async fn recover(&self) -> StoreResult<bool> {
        match tokio::fs::rename(&self.backup, &self.path).await {
            Ok(()) => {
                tracing::warn!(
                    path = %self.path.display(),
                    backup = %self.backup.display(),
                    "restored policy left by an interrupted rotation"
                );
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io("recover backup", &self.backup, e)),
        }
    }

    /// Atomically replace the active file, then read it back.
    pub async fn write(&self, data: &[u8]) -> StoreResult<()> {
        atomic_write(&self.path, data, POLICY_MODE)
            .await
            .map_err(|e| StoreError::io("write", &self.path, e))?;

        let written = tokio::fs::read(&self.path)
            .await
            .map_err(|e| StoreError::io("read back", &self.path, e))?;
        if written != data {
            return Err(StoreError::Verify {
                path: self.path.clone(),
            });
        }
        tracing::debug!(path = %self.path.display(), len = data.len(), "policy file written");
        Ok(())
    }

    pub async fn discard(&self, token: &FileCheckpoint) -> StoreResult<()> {
        tokio::fs::remove_file(&token.backup)
            .await
            .map_err(|e| StoreError::io("remove backup", &token.backup, e))
    }

    pub async fn restore(&self, token: &FileCheckpoint) -> StoreResult<()> {
        tokio::fs::rename(&token.backup, &self.path)
            .await
            .map_err(|e| StoreError::io("restore backup", &token.backup, e))?;
        tracing::debug!(path = %self.path.display(), "policy file restored");
        Ok(())
    }
}

#[async_trait]
impl BackingStore<AuthzChange> for FilePolicyStore {
    type Token = FileCheckpoint;

    async fn checkpoint(&self) -> StoreResult<FileCheckpoint> {
        self.take_checkpoint().await
    }

    async fn apply(&self, change: &AuthzChange) -> StoreResult<()> {
        self.write(change.policy.as_bytes()).await
    }

    async fn commit(&self, token: &FileCheckpoint) -> StoreResult<()> {
        self.discard(token).await
    }

    async fn rollback(&self, token: &FileCheckpoint) -> StoreResult<()> {
        self.restore(token).await
    }
}
