//! Self-service profile endpoints.

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    dtos::{user::UpdateAddressRequest, ErrorResponse},
    handlers::ensure_available,
    middleware::CurrentAccount,
    models::AccountResponse,
    utils::ValidatedJson,
    AppState,
};
use service_core::error::AppError;

/// Return the caller's own account.
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Account not available", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_me(CurrentAccount(account): CurrentAccount) -> Result<impl IntoResponse, AppError> {
    ensure_available(&account)?;
    Ok(Json(account.sanitized()))
}

/// Update the caller's address. `null` clears it.
#[utoipa::path(
    patch,
    path = "/users/me/address",
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Account not available", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[tracing::instrument(skip_all, fields(email = %account.email))]
pub async fn update_address(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    ValidatedJson(req): ValidatedJson<UpdateAddressRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_available(&account)?;

    let updated = state
        .store
        .update_address(&account.email, req.address)
        .await?;

    tracing::info!("Address updated");
    Ok(Json(updated.sanitized()))
}
