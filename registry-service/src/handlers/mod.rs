pub mod admin;
pub mod artifact;
pub mod auth;
pub mod user;

use crate::models::Account;
use service_core::error::AppError;

/// Login gate: only an approved, non-rejected, non-archived account may
/// proceed. The denial is deliberately generic so callers cannot probe
/// which flag gated them out.
pub(crate) fn ensure_available(account: &Account) -> Result<(), AppError> {
    if account.state.allows_login() {
        Ok(())
    } else {
        Err(AppError::Forbidden(anyhow::anyhow!("Account not available")))
    }
}
