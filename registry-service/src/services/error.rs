use service_core::error::AppError;
use thiserror::Error;

use crate::services::otp::OtpError;
use crate::services::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account not available")]
    AccountNotAvailable,

    #[error("{0}")]
    Otp(#[from] OtpError),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(e) => e.into(),
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid email or password"))
            }
            ServiceError::AccountNotAvailable => {
                AppError::Forbidden(anyhow::anyhow!("Account not available"))
            }
            ServiceError::Otp(e) => AppError::AuthError(anyhow::anyhow!(e.to_string())),
            ServiceError::Email(e) => AppError::EmailError(e),
            ServiceError::Validation(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound(anyhow::anyhow!("record not found")),
            StoreError::AlreadyExists => {
                AppError::Conflict(anyhow::anyhow!("record already exists"))
            }
            StoreError::Transition(e) => AppError::Conflict(anyhow::anyhow!(e.to_string())),
            StoreError::Internal(e) => AppError::DatabaseError(anyhow::anyhow!(e)),
        }
    }
}
