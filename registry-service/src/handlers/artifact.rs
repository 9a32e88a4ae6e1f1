//! Artifact upload and listing.
//!
//! Uploads arrive as multipart form data. The file's bytes are hashed with
//! SHA-256 and the hex digest becomes the artifact's identity: a second
//! upload of the same bytes is a conflict no matter who sends it or what
//! name/version it claims.

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::{
    dtos::ErrorResponse,
    handlers::ensure_available,
    middleware::CurrentAccount,
    models::{Artifact, ArtifactResponse, ArtifactState},
    services::{notify, StoreError},
    AppState,
};
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct ArtifactListQuery {
    pub state: Option<String>,
}

/// Upload a software artifact for review.
#[utoipa::path(
    post,
    path = "/artifacts",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Artifact submitted for review", body = ArtifactResponse),
        (status = 400, description = "Missing multipart field", body = ErrorResponse),
        (status = 403, description = "Account not available", body = ErrorResponse),
        (status = 409, description = "Identical content already uploaded", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Artifacts"
)]
#[tracing::instrument(skip_all, fields(email = %account.email))]
pub async fn upload_artifact(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    ensure_available(&account)?;

    let mut name: Option<String> = None;
    let mut version: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid multipart payload: {}", e)))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => {
                name = Some(read_text_field(field).await?);
            }
            Some("version") => {
                version = Some(read_text_field(field).await?);
            }
            Some("file") => {
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read file field: {}", e))
                })?;
                content = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let name = require_field(name, "name")?;
    let version = require_field(version, "version")?;
    let content = require_field(content, "file")?;

    let content_hash = Artifact::hash_bytes(&content);
    let artifact = Artifact::new(name, version, content_hash, account.email.clone());

    state
        .store
        .insert_artifact(artifact.clone())
        .await
        .map_err(|e| match e {
            StoreError::AlreadyExists => {
                AppError::Conflict(anyhow::anyhow!("Identical content has already been uploaded"))
            }
            other => other.into(),
        })?;

    tracing::info!(content_hash = %artifact.content_hash, "Artifact submitted for review");
    notify::artifact_submitted(&state.email, &state.config.admin_email, &artifact).await;

    Ok((StatusCode::CREATED, Json(artifact.sanitized())))
}

/// List the caller's own uploads, optionally filtered by decision state.
#[utoipa::path(
    get,
    path = "/artifacts/mine",
    params(("state" = Option<String>, Query, description = "pending | approved | rejected")),
    responses(
        (status = 200, description = "Caller's uploads", body = [ArtifactResponse]),
        (status = 400, description = "Invalid state filter", body = ErrorResponse),
        (status = 403, description = "Account not available", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Artifacts"
)]
pub async fn list_my_artifacts(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
    Query(query): Query<ArtifactListQuery>,
) -> Result<impl IntoResponse, AppError> {
    ensure_available(&account)?;

    let filter = parse_state_filter(query.state.as_deref())?;
    let artifacts = state
        .store
        .list_artifacts(filter, Some(&account.email))
        .await?;

    Ok(Json(sanitize_all(artifacts)))
}

/// List every approved artifact in the registry.
#[utoipa::path(
    get,
    path = "/artifacts/approved",
    responses(
        (status = 200, description = "Approved artifacts", body = [ArtifactResponse]),
        (status = 403, description = "Account not available", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Artifacts"
)]
pub async fn list_approved_artifacts(
    State(state): State<AppState>,
    CurrentAccount(account): CurrentAccount,
) -> Result<impl IntoResponse, AppError> {
    ensure_available(&account)?;

    let artifacts = state
        .store
        .list_artifacts(Some(ArtifactState::Approved), None)
        .await?;

    Ok(Json(sanitize_all(artifacts)))
}

pub(crate) fn parse_state_filter(raw: Option<&str>) -> Result<Option<ArtifactState>, AppError> {
    raw.map(|s| {
        s.parse::<ArtifactState>()
            .map_err(|msg| AppError::BadRequest(anyhow::anyhow!(msg)))
    })
    .transpose()
}

pub(crate) fn sanitize_all(artifacts: Vec<Artifact>) -> Vec<ArtifactResponse> {
    artifacts.iter().map(Artifact::sanitized).collect()
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read form field: {}", e)))
}

fn require_field<T>(value: Option<T>, name: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing required field: {}", name)))
}
