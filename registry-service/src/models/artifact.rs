//! Software artifact model.
//!
//! An artifact is identified by the SHA-256 digest of its exact byte
//! content. Name and version are free text and carry no uniqueness; the
//! hash is the identity key and the duplicate-detection key across all
//! uploaders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use super::account::TransitionError;

/// Decision state of an uploaded artifact. Unlike accounts there is no
/// archived state, and a decided artifact is immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactState {
    Pending,
    Approved,
    Rejected,
}

impl ArtifactState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactState::Pending => "pending",
            ArtifactState::Approved => "approved",
            ArtifactState::Rejected => "rejected",
        }
    }

    pub fn decide(self, approve: bool) -> Result<Self, TransitionError> {
        match self {
            ArtifactState::Pending => Ok(if approve {
                ArtifactState::Approved
            } else {
                ArtifactState::Rejected
            }),
            _ => Err(TransitionError::AlreadyDecided),
        }
    }
}

impl std::str::FromStr for ArtifactState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ArtifactState::Pending),
            "approved" => Ok(ArtifactState::Approved),
            "rejected" => Ok(ArtifactState::Rejected),
            _ => Err(format!("Invalid artifact state: {}", s)),
        }
    }
}

/// Artifact entity, keyed by content hash.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub version: String,
    pub content_hash: String,
    pub developer_email: String,
    pub state: ArtifactState,
    pub created_utc: DateTime<Utc>,
}

impl Artifact {
    pub fn new(
        name: String,
        version: String,
        content_hash: String,
        developer_email: String,
    ) -> Self {
        Self {
            name,
            version,
            content_hash,
            developer_email,
            state: ArtifactState::Pending,
            created_utc: Utc::now(),
        }
    }

    /// Hex-encoded SHA-256 digest of the uploaded bytes.
    pub fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    pub fn sanitized(&self) -> ArtifactResponse {
        ArtifactResponse {
            name: self.name.clone(),
            version: self.version.clone(),
            content_hash: self.content_hash.clone(),
            developer_email: self.developer_email.clone(),
            status: self.state.as_str().to_string(),
            created_utc: self.created_utc,
        }
    }
}

/// Artifact projection for API responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ArtifactResponse {
    #[schema(example = "media-player")]
    pub name: String,
    #[schema(example = "1.4.2")]
    pub version: String,
    #[schema(example = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")]
    pub content_hash: String,
    #[schema(example = "dev@example.com")]
    pub developer_email: String,
    #[schema(example = "pending")]
    pub status: String,
    pub created_utc: DateTime<Utc>,
}
