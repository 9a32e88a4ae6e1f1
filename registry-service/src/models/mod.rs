pub mod account;
pub mod artifact;

pub use account::{Account, AccountResponse, AdmissionState, Role, Standing, TransitionError};
pub use artifact::{Artifact, ArtifactResponse, ArtifactState};
