pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Json, Router,
};
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{openapi::security::SecurityScheme, Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{RegistryConfig, SwaggerMode};
use crate::services::{EmailProvider, JwtService, OtpManager, Store};
use service_core::error::AppError;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::resend_otp,
        handlers::auth::verify_otp,
        handlers::user::get_me,
        handlers::user::update_address,
        handlers::artifact::upload_artifact,
        handlers::artifact::list_my_artifacts,
        handlers::artifact::list_approved_artifacts,
        handlers::admin::list_accounts,
        handlers::admin::create_admin,
        handlers::admin::approve_account,
        handlers::admin::reject_account,
        handlers::admin::archive_account,
        handlers::admin::unarchive_account,
        handlers::admin::list_artifacts,
        handlers::admin::approve_artifact,
        handlers::admin::reject_artifact,
        handlers::admin::send_feedback,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::LoginRequest,
            dtos::auth::ResendOtpRequest,
            dtos::auth::VerifyOtpRequest,
            dtos::auth::TokenResponse,
            dtos::user::UpdateAddressRequest,
            dtos::admin::CreateAdminRequest,
            dtos::admin::FeedbackRequest,
            models::Role,
            models::ArtifactState,
            models::AccountResponse,
            models::ArtifactResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration and OTP login"),
        (name = "Users", description = "Self-service profile"),
        (name = "Artifacts", description = "Software upload and listing"),
        (name = "Admin", description = "Account and artifact review"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: RegistryConfig,
    pub store: Arc<dyn Store>,
    pub email: Arc<dyn EmailProvider>,
    pub jwt: JwtService,
    pub otp: OtpManager,
}

pub fn build_router(state: AppState) -> Router {
    // Admin routes: access guard plus role gate
    let admin_routes = Router::new()
        .route(
            "/admin/accounts",
            get(handlers::admin::list_accounts).post(handlers::admin::create_admin),
        )
        .route(
            "/admin/accounts/:email/approve",
            post(handlers::admin::approve_account),
        )
        .route(
            "/admin/accounts/:email/reject",
            post(handlers::admin::reject_account),
        )
        .route(
            "/admin/accounts/:email/archive",
            post(handlers::admin::archive_account),
        )
        .route(
            "/admin/accounts/:email/unarchive",
            post(handlers::admin::unarchive_account),
        )
        .route("/admin/artifacts", get(handlers::admin::list_artifacts))
        .route(
            "/admin/artifacts/:hash/approve",
            post(handlers::admin::approve_artifact),
        )
        .route(
            "/admin/artifacts/:hash/reject",
            post(handlers::admin::reject_artifact),
        )
        .route("/admin/feedback", post(handlers::admin::send_feedback))
        .layer(from_fn(middleware::require_admin));

    // Self-service routes: access guard only; handlers re-apply the login
    // gate against the current stored state
    let user_routes = Router::new()
        .route("/users/me", get(handlers::user::get_me))
        .route("/users/me/address", patch(handlers::user::update_address))
        .route("/artifacts", post(handlers::artifact::upload_artifact))
        .route("/artifacts/mine", get(handlers::artifact::list_my_artifacts))
        .route(
            "/artifacts/approved",
            get(handlers::artifact::list_approved_artifacts),
        );

    let protected_routes = user_routes
        .merge(admin_routes)
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    let mut app = Router::new().route("/health", get(health_check));

    let swagger_enabled = matches!(state.config.swagger.enabled, SwaggerMode::Public);
    if swagger_enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        // Keep the OpenAPI JSON available for programmatic access
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    app.route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/resend-otp", post(handlers::auth::resend_otp))
        .route("/auth/verify-otp", post(handlers::auth::verify_otp))
        .merge(protected_routes)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            let request_id = request
                .headers()
                .get(service_core::middleware::tracing::REQUEST_ID_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");

            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .filter_map(|origin| match origin.parse::<HeaderValue>() {
                            Ok(value) => Some(value),
                            Err(e) => {
                                tracing::error!(origin = %origin, error = %e, "Invalid CORS origin, skipping");
                                None
                            }
                        })
                        .collect::<Vec<HeaderValue>>(),
                )
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Storage unavailable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Storage health check failed");
        AppError::from(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    })))
}
