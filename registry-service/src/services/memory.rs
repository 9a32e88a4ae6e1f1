//! In-process store backed by concurrent maps.
//!
//! Per-key atomicity comes from DashMap shard locks: `entry`/`get_mut`
//! hold the shard write lock for the duration of the guard, so
//! insert-if-absent and guarded transitions cannot interleave for the
//! same key.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::models::{Account, Artifact, ArtifactState};
use crate::services::store::{AccountAction, StateFilter, Store, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: DashMap<String, Account>,
    artifacts: DashMap<String, Artifact>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_account(&self, account: Account) -> Result<(), StoreError> {
        match self.accounts.entry(account.email.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(account);
                Ok(())
            }
        }
    }

    async fn find_account(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(email).map(|entry| entry.clone()))
    }

    async fn list_accounts(&self, filter: StateFilter) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|entry| filter.matches(&entry.state))
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(accounts)
    }

    async fn update_address(
        &self,
        email: &str,
        address: Option<String>,
    ) -> Result<Account, StoreError> {
        let mut entry = self.accounts.get_mut(email).ok_or(StoreError::NotFound)?;
        entry.address = address;
        Ok(entry.clone())
    }

    async fn transition_account(
        &self,
        email: &str,
        action: AccountAction,
    ) -> Result<Account, StoreError> {
        let mut entry = self.accounts.get_mut(email).ok_or(StoreError::NotFound)?;
        let next = match action {
            AccountAction::Approve => entry.state.approve()?,
            AccountAction::Reject => entry.state.reject()?,
            AccountAction::Archive => entry.state.archive(entry.role)?,
            AccountAction::Unarchive => entry.state.unarchive()?,
        };
        entry.state = next;
        Ok(entry.clone())
    }

    async fn insert_artifact(&self, artifact: Artifact) -> Result<(), StoreError> {
        match self.artifacts.entry(artifact.content_hash.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(artifact);
                Ok(())
            }
        }
    }

    async fn find_artifact(&self, content_hash: &str) -> Result<Option<Artifact>, StoreError> {
        Ok(self.artifacts.get(content_hash).map(|entry| entry.clone()))
    }

    async fn list_artifacts(
        &self,
        state: Option<ArtifactState>,
        developer_email: Option<&str>,
    ) -> Result<Vec<Artifact>, StoreError> {
        let mut artifacts: Vec<Artifact> = self
            .artifacts
            .iter()
            .filter(|entry| state.map_or(true, |s| entry.state == s))
            .filter(|entry| developer_email.map_or(true, |d| entry.developer_email == d))
            .map(|entry| entry.value().clone())
            .collect();
        artifacts.sort_by(|a, b| a.content_hash.cmp(&b.content_hash));
        Ok(artifacts)
    }

    async fn decide_artifact(
        &self,
        content_hash: &str,
        approve: bool,
    ) -> Result<Artifact, StoreError> {
        let mut entry = self
            .artifacts
            .get_mut(content_hash)
            .ok_or(StoreError::NotFound)?;
        entry.state = entry.state.decide(approve)?;
        Ok(entry.clone())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdmissionState, TransitionError};

    fn account(email: &str) -> Account {
        Account::new(email.to_string(), "hash".to_string())
    }

    #[tokio::test]
    async fn insert_account_is_insert_if_absent() {
        let store = MemoryStore::new();
        store.insert_account(account("a@b.com")).await.unwrap();

        let err = store.insert_account(account("a@b.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists));

        let all = store.list_accounts(StateFilter::Pending).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn transition_applies_guards() {
        let store = MemoryStore::new();
        store.insert_account(account("a@b.com")).await.unwrap();

        let approved = store
            .transition_account("a@b.com", AccountAction::Approve)
            .await
            .unwrap();
        assert_eq!(approved.state, AdmissionState::Approved);

        let err = store
            .transition_account("a@b.com", AccountAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Transition(TransitionError::AlreadyApproved)
        ));

        let err = store
            .transition_account("missing@b.com", AccountAction::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn artifact_hash_is_the_identity_key() {
        let store = MemoryStore::new();
        let artifact = Artifact::new(
            "tool".to_string(),
            "1.0".to_string(),
            "deadbeef".to_string(),
            "a@b.com".to_string(),
        );
        store.insert_artifact(artifact).await.unwrap();

        // Same hash, different name/version/uploader: still a duplicate.
        let duplicate = Artifact::new(
            "other".to_string(),
            "2.0".to_string(),
            "deadbeef".to_string(),
            "c@d.com".to_string(),
        );
        let err = store.insert_artifact(duplicate).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists));
    }

    #[tokio::test]
    async fn decided_artifacts_are_immutable() {
        let store = MemoryStore::new();
        store
            .insert_artifact(Artifact::new(
                "tool".to_string(),
                "1.0".to_string(),
                "deadbeef".to_string(),
                "a@b.com".to_string(),
            ))
            .await
            .unwrap();

        let rejected = store.decide_artifact("deadbeef", false).await.unwrap();
        assert_eq!(rejected.state, ArtifactState::Rejected);

        let err = store.decide_artifact("deadbeef", true).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Transition(TransitionError::AlreadyDecided)
        ));
    }

    #[tokio::test]
    async fn list_artifacts_filters_by_state_and_developer() {
        let store = MemoryStore::new();
        for (hash, dev) in [("h1", "a@b.com"), ("h2", "a@b.com"), ("h3", "c@d.com")] {
            store
                .insert_artifact(Artifact::new(
                    "tool".to_string(),
                    "1.0".to_string(),
                    hash.to_string(),
                    dev.to_string(),
                ))
                .await
                .unwrap();
        }
        store.decide_artifact("h1", true).await.unwrap();

        let mine = store
            .list_artifacts(None, Some("a@b.com"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);

        let approved = store
            .list_artifacts(Some(ArtifactState::Approved), None)
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].content_hash, "h1");
    }
}
