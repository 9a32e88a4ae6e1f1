//! Authentication flow: register, login, resend-otp, verify-otp.
//!
//! Login is two-factor: password verification issues an emailed OTP, and
//! only OTP verification yields a session token. The lifecycle gate is
//! applied before any code is generated, so no OTP ever exists for a
//! pending, rejected, or archived account.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    dtos::{
        auth::{LoginRequest, RegisterRequest, ResendOtpRequest, TokenResponse, VerifyOtpRequest},
        ErrorResponse, MessageResponse,
    },
    handlers::ensure_available,
    models::Account,
    services::{notify, ServiceError, StoreError},
    utils::{hash_password, validate_password_policy, verify_password, Password, PasswordHashString, ValidatedJson},
    AppState,
};
use service_core::error::AppError;

/// Register a new user account, pending administrator approval.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = MessageResponse),
        (status = 400, description = "Password policy violation", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_password_policy(&req.password)
        .map_err(|msg| AppError::BadRequest(anyhow::anyhow!(msg)))?;

    let hash = hash_password(&Password::new(req.password))?;
    let account = Account::new(req.email.clone(), hash.into_string());

    state.store.insert_account(account).await.map_err(|e| match e {
        StoreError::AlreadyExists => AppError::Conflict(anyhow::anyhow!("Email already registered")),
        other => other.into(),
    })?;

    tracing::info!("User registered, pending approval");
    notify::registration_pending(&state.email, &req.email).await;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// Verify credentials and send an OTP to the account's mailbox.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "OTP sent", body = MessageResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account not available", body = ErrorResponse),
        (status = 500, description = "OTP delivery failed", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .store
        .find_account(&req.email)
        .await?
        .ok_or_else(|| ServiceError::InvalidCredentials)?;

    let hash = PasswordHashString::new(account.password_hash.clone());
    verify_password(&Password::new(req.password), &hash)
        .map_err(|_| ServiceError::InvalidCredentials)?;

    ensure_available(&account)?;

    issue_and_send_otp(&state, &account.email).await?;

    Ok(Json(MessageResponse::new("OTP sent to your email")))
}

/// Re-issue the OTP under the same lifecycle gate as login.
#[utoipa::path(
    post,
    path = "/auth/resend-otp",
    request_body = ResendOtpRequest,
    responses(
        (status = 200, description = "OTP sent", body = MessageResponse),
        (status = 403, description = "Account not available", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn resend_otp(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResendOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .store
        .find_account(&req.email)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Account not found")))?;

    ensure_available(&account)?;

    issue_and_send_otp(&state, &account.email).await?;

    Ok(Json(MessageResponse::new("OTP sent to your email")))
}

/// Exchange a valid OTP for a session token.
#[utoipa::path(
    post,
    path = "/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Session token issued", body = TokenResponse),
        (status = 401, description = "Invalid OTP", body = ErrorResponse),
        (status = 403, description = "Account not available", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = state
        .store
        .find_account(&req.email)
        .await?
        .ok_or_else(|| AppError::AuthError(anyhow::anyhow!("Invalid OTP")))?;

    ensure_available(&account)?;

    state
        .otp
        .verify(&account.email, &req.otp)
        .map_err(ServiceError::from)?;

    let token = state.jwt.generate_token(&account.email, account.role)?;

    tracing::info!("OTP verified and session token issued");
    Ok(Json(TokenResponse::new(token, account.role)))
}

/// Generate a fresh OTP and deliver it. Delivery failure is surfaced:
/// unlike lifecycle notifications, the code IS the operation's output.
async fn issue_and_send_otp(state: &AppState, email: &str) -> Result<(), AppError> {
    let code = state.otp.issue(email);
    let (subject, body) = notify::otp_message(&code);

    state
        .email
        .send(email, &subject, &body)
        .await
        .map_err(AppError::from)?;

    // Never log the code itself
    tracing::info!(to = %email, "OTP issued and sent");
    Ok(())
}
