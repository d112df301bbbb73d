use async_trait::async_trait;
use rotor_pathz::{PathzAuthorizer, PolicySnapshot};
use std::sync::Arc;

use super::BackingStore;
use super::file::{FileCheckpoint, FilePolicyStore};
use crate::error::{StoreError, StoreResult};
use crate::protocol::pathz::PathzChange;

/// Saved file and in-memory policy.
#[derive(Debug, Clone)]
pub struct PathzCheckpoint {
    pub file: FileCheckpoint,
    pub policy: PolicySnapshot,
}

/// Pathz policy file plus the live authorizer built from it.
///
/// Both are replaced together on apply and restored together on rollback.
#[derive(Debug, Clone)]
pub struct PathzStore {
    file: FilePolicyStore,
    authorizer: Arc<PathzAuthorizer>,
}

impl PathzStore {
    pub fn new(file: FilePolicyStore, authorizer: Arc<PathzAuthorizer>) -> Self {
        Self { file, authorizer }
    }

    pub fn file(&self) -> &FilePolicyStore {
        &self.file
    }

    pub fn authorizer(&self) -> &Arc<PathzAuthorizer> {
        &self.authorizer
    }
}

#[async_trait]
impl BackingStore<PathzChange> for PathzStore {
    type Token = PathzCheckpoint;

    async fn checkpoint(&self) -> StoreResult<PathzCheckpoint> {
        let file = self.file.take_checkpoint().await?;
        Ok(PathzCheckpoint {
            file,
            policy: self.authorizer.snapshot(),
        })
    }

    async fn apply(&self, change: &PathzChange) -> StoreResult<()> {
        let mut data = serde_json::to_vec_pretty(&change.policy)
            .map_err(|e| StoreError::Encode(e.to_string()))?;
        data.push(b'\n');
        self.file.write(&data).await?;
        self.authorizer.update_policy(change.policy.clone())?;
        tracing::debug!(rules = change.policy.rules.len(), "pathz policy installed");
        Ok(())
    }

    async fn commit(&self, token: &PathzCheckpoint) -> StoreResult<()> {
        self.file.discard(&token.file).await
    }

    async fn rollback(&self, token: &PathzCheckpoint) -> StoreResult<()> {
        self.authorizer.restore(token.policy.clone());
        self.file.restore(&token.file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotor_pathz::{Action, AuthorizationPolicy, AuthorizationRule, Mode, Path, Principal};

    fn policy(action: Action) -> AuthorizationPolicy {
        AuthorizationPolicy {
            rules: vec![AuthorizationRule {
                id: "r1".into(),
                path: "/interfaces".parse().unwrap(),
                principal: Principal::User("alice".into()),
                mode: Mode::Read,
                action,
            }],
            groups: Vec::new(),
        }
    }

    fn change(action: Action) -> PathzChange {
        PathzChange {
            version: "p1".into(),
            created_on: 1,
            policy: policy(action),
            force: false,
        }
    }

    async fn store_with(initial: AuthorizationPolicy) -> (tempfile::TempDir, PathzStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gnmi_pathz.pb.txt");
        tokio::fs::write(&path, serde_json::to_vec(&initial).unwrap())
            .await
            .unwrap();
        let authorizer = Arc::new(PathzAuthorizer::new());
        authorizer.update_policy(initial).unwrap();
        (dir, PathzStore::new(FilePolicyStore::pathz(path), authorizer))
    }

    fn decision(store: &PathzStore) -> Action {
        let path: Path = "/interfaces".parse().unwrap();
        store
            .authorizer()
            .authorize("alice", &path, Mode::Read)
            .unwrap()
            .action
    }

    #[tokio::test]
    async fn apply_swaps_file_and_authorizer() {
        let (_dir, store) = store_with(policy(Action::Deny)).await;

        let token = store.checkpoint().await.unwrap();
        store.apply(&change(Action::Permit)).await.unwrap();
        store.commit(&token).await.unwrap();

        assert_eq!(decision(&store), Action::Permit);
        let on_disk: AuthorizationPolicy =
            serde_json::from_slice(&tokio::fs::read(store.file().path()).await.unwrap()).unwrap();
        assert_eq!(on_disk, policy(Action::Permit));
    }

    #[tokio::test]
    async fn rollback_restores_both() {
        let (_dir, store) = store_with(policy(Action::Deny)).await;
        let before = tokio::fs::read(store.file().path()).await.unwrap();

        let token = store.checkpoint().await.unwrap();
        store.apply(&change(Action::Permit)).await.unwrap();
        store.rollback(&token).await.unwrap();

        assert_eq!(decision(&store), Action::Deny);
        assert_eq!(tokio::fs::read(store.file().path()).await.unwrap(), before);
    }
}
