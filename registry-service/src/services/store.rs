//! Persistence contract for accounts and artifacts.
//!
//! The core talks to storage through this trait only: insert-if-absent by
//! unique key, point lookup, filtered scan, in-place update, and atomic
//! state transitions. "Not found" and "already exists" are distinguishable
//! conditions. `MemoryStore` is the in-process implementation; a durable
//! backend can be swapped in without touching the state machine logic.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Account, AdmissionState, Artifact, ArtifactState, TransitionError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    AlreadyExists,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("storage failure: {0}")]
    Internal(String),
}

/// Admin action applied to an account as one atomic transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountAction {
    Approve,
    Reject,
    Archive,
    Unarchive,
}

/// Account scan filter, one bucket per admission label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    Pending,
    Approved,
    Rejected,
    Archived,
}

impl StateFilter {
    pub fn matches(&self, state: &AdmissionState) -> bool {
        matches!(
            (self, state),
            (StateFilter::Pending, AdmissionState::Pending)
                | (StateFilter::Approved, AdmissionState::Approved)
                | (StateFilter::Rejected, AdmissionState::Rejected)
                | (StateFilter::Archived, AdmissionState::Archived(_))
        )
    }
}

impl std::str::FromStr for StateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(StateFilter::Pending),
            "approved" => Ok(StateFilter::Approved),
            "rejected" => Ok(StateFilter::Rejected),
            "archived" => Ok(StateFilter::Archived),
            _ => Err(format!("Invalid account state: {}", s)),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_account(&self, account: Account) -> Result<(), StoreError>;

    async fn find_account(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn list_accounts(&self, filter: StateFilter) -> Result<Vec<Account>, StoreError>;

    async fn update_address(
        &self,
        email: &str,
        address: Option<String>,
    ) -> Result<Account, StoreError>;

    /// Apply a lifecycle transition atomically: the guard check and the
    /// write happen under the same per-key lock, so a racing approve and
    /// reject cannot both pass their guards.
    async fn transition_account(
        &self,
        email: &str,
        action: AccountAction,
    ) -> Result<Account, StoreError>;

    async fn insert_artifact(&self, artifact: Artifact) -> Result<(), StoreError>;

    async fn find_artifact(&self, content_hash: &str) -> Result<Option<Artifact>, StoreError>;

    async fn list_artifacts(
        &self,
        state: Option<ArtifactState>,
        developer_email: Option<&str>,
    ) -> Result<Vec<Artifact>, StoreError>;

    /// Decide a pending artifact atomically; decided artifacts are
    /// immutable.
    async fn decide_artifact(
        &self,
        content_hash: &str,
        approve: bool,
    ) -> Result<Artifact, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
