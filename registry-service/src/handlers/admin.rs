//! Administrator operations: account review, admin creation, artifact
//! review, and feedback forwarding.
//!
//! Every route here sits behind both the access guard and `require_admin`.
//! Lifecycle decisions go through the store's atomic transitions; invalid
//! transitions (already decided, archived, admin target) surface as
//! conflicts from the state machine itself.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{
    dtos::{
        admin::{CreateAdminRequest, FeedbackRequest},
        ErrorResponse, MessageResponse,
    },
    handlers::artifact::{parse_state_filter, sanitize_all, ArtifactListQuery},
    middleware::CurrentAccount,
    models::{Account, AccountResponse, ArtifactResponse},
    services::{notify, AccountAction, StateFilter, StoreError},
    utils::{hash_password, validate_password_policy, Password, ValidatedJson},
    AppState,
};
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct AccountListQuery {
    pub state: Option<String>,
}

/// List accounts by admission state. Defaults to the pending review queue.
#[utoipa::path(
    get,
    path = "/admin/accounts",
    params(("state" = Option<String>, Query, description = "pending | approved | rejected | archived")),
    responses(
        (status = 200, description = "Accounts in the requested state", body = [AccountResponse]),
        (status = 400, description = "Invalid state filter", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    Query(query): Query<AccountListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = match query.state.as_deref() {
        Some(raw) => raw
            .parse::<StateFilter>()
            .map_err(|msg| AppError::BadRequest(anyhow::anyhow!(msg)))?,
        None => StateFilter::Pending,
    };

    let accounts = state.store.list_accounts(filter).await?;
    let responses: Vec<AccountResponse> = accounts.iter().map(Account::sanitized).collect();

    Ok(Json(responses))
}

/// Create another administrator account, approved from the start.
#[utoipa::path(
    post,
    path = "/admin/accounts",
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Administrator created", body = AccountResponse),
        (status = 400, description = "Password policy violation", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn create_admin(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateAdminRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_password_policy(&req.password)
        .map_err(|msg| AppError::BadRequest(anyhow::anyhow!(msg)))?;

    let hash = hash_password(&Password::new(req.password))?;
    let account = Account::new_admin(req.email.clone(), hash.into_string());
    let response = account.sanitized();

    state.store.insert_account(account).await.map_err(|e| match e {
        StoreError::AlreadyExists => AppError::Conflict(anyhow::anyhow!("Email already registered")),
        other => other.into(),
    })?;

    tracing::info!("Administrator account created");
    notify::admin_created(&state.email, &req.email).await;

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    post,
    path = "/admin/accounts/{email}/approve",
    params(("email" = String, Path, description = "Account email")),
    responses(
        (status = 200, description = "Account approved", body = AccountResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_account(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    transition(state, email, AccountAction::Approve).await
}

#[utoipa::path(
    post,
    path = "/admin/accounts/{email}/reject",
    params(("email" = String, Path, description = "Account email")),
    responses(
        (status = 200, description = "Account rejected", body = AccountResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reject_account(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    transition(state, email, AccountAction::Reject).await
}

#[utoipa::path(
    post,
    path = "/admin/accounts/{email}/archive",
    params(("email" = String, Path, description = "Account email")),
    responses(
        (status = 200, description = "Account archived", body = AccountResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn archive_account(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    transition(state, email, AccountAction::Archive).await
}

#[utoipa::path(
    post,
    path = "/admin/accounts/{email}/unarchive",
    params(("email" = String, Path, description = "Account email")),
    responses(
        (status = 200, description = "Account restored to its prior standing", body = AccountResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn unarchive_account(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    transition(state, email, AccountAction::Unarchive).await
}

/// List every artifact, optionally filtered by decision state.
#[utoipa::path(
    get,
    path = "/admin/artifacts",
    params(("state" = Option<String>, Query, description = "pending | approved | rejected")),
    responses(
        (status = 200, description = "Artifacts in the requested state", body = [ArtifactResponse]),
        (status = 400, description = "Invalid state filter", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_artifacts(
    State(state): State<AppState>,
    Query(query): Query<ArtifactListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = parse_state_filter(query.state.as_deref())?;
    let artifacts = state.store.list_artifacts(filter, None).await?;

    Ok(Json(sanitize_all(artifacts)))
}

#[utoipa::path(
    post,
    path = "/admin/artifacts/{hash}/approve",
    params(("hash" = String, Path, description = "Artifact content hash")),
    responses(
        (status = 200, description = "Artifact approved", body = ArtifactResponse),
        (status = 404, description = "Artifact not found", body = ErrorResponse),
        (status = 409, description = "Artifact already decided", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_artifact(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    decide_artifact(state, hash, true).await
}

#[utoipa::path(
    post,
    path = "/admin/artifacts/{hash}/reject",
    params(("hash" = String, Path, description = "Artifact content hash")),
    responses(
        (status = 200, description = "Artifact rejected", body = ArtifactResponse),
        (status = 404, description = "Artifact not found", body = ErrorResponse),
        (status = 409, description = "Artifact already decided", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reject_artifact(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    decide_artifact(state, hash, false).await
}

/// Forward a feedback message to the configured admin mailbox.
#[utoipa::path(
    post,
    path = "/admin/feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback forwarded", body = MessageResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
#[tracing::instrument(skip_all, fields(from = %account.email))]
pub async fn send_feedback(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    ValidatedJson(req): ValidatedJson<FeedbackRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject = req
        .subject
        .unwrap_or_else(|| "Registry feedback".to_string());
    let body = format!("From: {}\n\n{}", account.email, req.message);

    state
        .email
        .send(&state.config.admin_email, &subject, &body)
        .await
        .map_err(AppError::from)?;

    Ok(Json(MessageResponse::new("Feedback sent")))
}

async fn transition(
    state: AppState,
    email: String,
    action: AccountAction,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state.store.transition_account(&email, action).await?;

    tracing::info!(email = %account.email, status = account.state.label(), "Account transitioned");
    match action {
        AccountAction::Unarchive => notify::account_restored(&state.email, &account.email).await,
        _ => notify::account_decision(&state.email, &account.email, account.state.label()).await,
    }

    Ok(Json(account.sanitized()))
}

async fn decide_artifact(
    state: AppState,
    hash: String,
    approve: bool,
) -> Result<Json<ArtifactResponse>, AppError> {
    let artifact = state.store.decide_artifact(&hash, approve).await?;

    tracing::info!(
        content_hash = %artifact.content_hash,
        status = artifact.state.as_str(),
        "Artifact decided"
    );
    notify::artifact_decided(&state.email, &artifact).await;

    Ok(Json(artifact.sanitized()))
}
