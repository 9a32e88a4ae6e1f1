//! Access guard.
//!
//! Every protected request resolves its bearer token to the CURRENT
//! account record: token verification alone is not enough, because a
//! token minted before a role change or archival must not grant the old
//! privileges. Storage is authoritative; a role mismatch between the
//! token claim and the stored account is a hard failure.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::models::{Account, Role};
use crate::AppState;
use service_core::error::AppError;

/// The storage-backed account resolved by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

    let claims = state
        .jwt
        .validate_token(token)
        .map_err(|_| AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token")))?;

    let account = state
        .store
        .find_account(&claims.sub)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Unknown account")))?;

    // The token's role claim is only a claim; the stored role decides.
    if account.role != claims.role {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Token role does not match account role"
        )));
    }

    req.extensions_mut().insert(CurrentAccount(account));

    Ok(next.run(req).await)
}

/// Layered inside `auth_middleware` on admin routes.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    match req.extensions().get::<CurrentAccount>() {
        Some(current) if current.0.role == Role::Admin => Ok(next.run(req).await),
        Some(_) => Err(AppError::Forbidden(anyhow::anyhow!(
            "Administrator role required"
        ))),
        None => Err(AppError::Unauthorized(anyhow::anyhow!(
            "Authentication required"
        ))),
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAccount>()
            .cloned()
            .ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "Account missing from request extensions"
                ))
            })
    }
}
