//! Account model and the admission state machine.
//!
//! The original storage layer encoded admission as three independent
//! booleans (approved/rejected/archived). Here the reachable combinations
//! are an explicit enum with a typed transition function, so invalid
//! states cannot be represented and transitions are checked in one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Authorization role carried in accounts and session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Standing of an account outside of archival.
///
/// Preserved inside `AdmissionState::Archived` so unarchiving restores
/// whatever the account was before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    Pending,
    Approved,
    Rejected,
}

/// The account admission state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "prior", rename_all = "lowercase")]
pub enum AdmissionState {
    Pending,
    Approved,
    Rejected,
    Archived(Standing),
}

/// Rejected state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("account is already approved")]
    AlreadyApproved,

    #[error("account is already rejected")]
    AlreadyRejected,

    #[error("account is already archived")]
    AlreadyArchived,

    #[error("account is not archived")]
    NotArchived,

    #[error("admin accounts cannot be archived")]
    AdminImmutable,

    #[error("artifact has already been decided")]
    AlreadyDecided,
}

impl AdmissionState {
    /// Whether the login gate holds: approved, not rejected, not archived.
    pub fn allows_login(&self) -> bool {
        matches!(self, AdmissionState::Approved)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdmissionState::Pending => "pending",
            AdmissionState::Approved => "approved",
            AdmissionState::Rejected => "rejected",
            AdmissionState::Archived(_) => "archived",
        }
    }

    pub fn approve(self) -> Result<Self, TransitionError> {
        match self {
            AdmissionState::Approved => Err(TransitionError::AlreadyApproved),
            AdmissionState::Archived(_) => Err(TransitionError::AlreadyArchived),
            AdmissionState::Pending | AdmissionState::Rejected => Ok(AdmissionState::Approved),
        }
    }

    pub fn reject(self) -> Result<Self, TransitionError> {
        match self {
            AdmissionState::Rejected => Err(TransitionError::AlreadyRejected),
            AdmissionState::Archived(_) => Err(TransitionError::AlreadyArchived),
            AdmissionState::Pending | AdmissionState::Approved => Ok(AdmissionState::Rejected),
        }
    }

    pub fn archive(self, role: Role) -> Result<Self, TransitionError> {
        if role == Role::Admin {
            return Err(TransitionError::AdminImmutable);
        }
        match self {
            AdmissionState::Archived(_) => Err(TransitionError::AlreadyArchived),
            AdmissionState::Pending => Ok(AdmissionState::Archived(Standing::Pending)),
            AdmissionState::Approved => Ok(AdmissionState::Archived(Standing::Approved)),
            AdmissionState::Rejected => Ok(AdmissionState::Archived(Standing::Rejected)),
        }
    }

    pub fn unarchive(self) -> Result<Self, TransitionError> {
        match self {
            AdmissionState::Archived(Standing::Pending) => Ok(AdmissionState::Pending),
            AdmissionState::Archived(Standing::Approved) => Ok(AdmissionState::Approved),
            AdmissionState::Archived(Standing::Rejected) => Ok(AdmissionState::Rejected),
            _ => Err(TransitionError::NotArchived),
        }
    }
}

/// Account entity.
#[derive(Debug, Clone)]
pub struct Account {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub state: AdmissionState,
    pub address: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl Account {
    /// Create a self-registered account, pending administrator approval.
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            email,
            password_hash,
            role: Role::User,
            state: AdmissionState::Pending,
            address: None,
            created_utc: Utc::now(),
        }
    }

    /// Create an administrator account, approved from the start.
    pub fn new_admin(email: String, password_hash: String) -> Self {
        Self {
            email,
            password_hash,
            role: Role::Admin,
            state: AdmissionState::Approved,
            address: None,
            created_utc: Utc::now(),
        }
    }

    /// Convert to sanitized response (no credential fields).
    pub fn sanitized(&self) -> AccountResponse {
        AccountResponse {
            email: self.email.clone(),
            role: self.role,
            status: self.state.label().to_string(),
            address: self.address.clone(),
            created_utc: self.created_utc,
        }
    }
}

/// Account projection for API responses (without sensitive fields).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountResponse {
    #[schema(example = "dev@example.com")]
    pub email: String,
    pub role: Role,
    #[schema(example = "pending")]
    pub status: String,
    pub address: Option<String>,
    pub created_utc: DateTime<Utc>,
}
