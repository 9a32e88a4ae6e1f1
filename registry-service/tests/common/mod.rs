#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use registry_service::{
    build_router,
    config::{
        Environment, JwtConfig, RegistryConfig, SecurityConfig, SmtpConfig, SwaggerConfig,
        SwaggerMode,
    },
    models::Account,
    services::{
        AccountAction, JwtService, MemoryStore, MockEmailService, OtpManager, Store,
    },
    utils::{hash_password, Password},
    AppState,
};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "Adm1nPass!";
pub const USER_PASSWORD: &str = "Passw0rd!";

pub const JWT_SECRET: &str = "integration-test-secret";

/// Full application wired against in-process fakes: `MemoryStore` for
/// persistence and `MockEmailService` as the captured mailbox.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub mailbox: MockEmailService,
    pub jwt: JwtService,
}

impl TestApp {
    /// Build the app with one seeded administrator account.
    pub async fn spawn() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let mailbox = MockEmailService::new();
        let jwt = JwtService::new(&config.jwt);

        let admin_hash = hash_password(&Password::new(ADMIN_PASSWORD.to_string()))
            .expect("failed to hash seed password");
        store
            .insert_account(Account::new_admin(
                ADMIN_EMAIL.to_string(),
                admin_hash.into_string(),
            ))
            .await
            .expect("failed to seed admin account");

        let state = AppState {
            config,
            store: store.clone(),
            email: Arc::new(mailbox.clone()),
            jwt: jwt.clone(),
            otp: OtpManager::new(),
        };

        Self {
            router: build_router(state),
            store,
            mailbox,
            jwt,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed")
    }

    pub async fn post_json(&self, path: &str, token: Option<&str>, body: Value) -> Response<Body> {
        self.request(Method::POST, path, token, Some(body)).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response<Body> {
        self.request(Method::GET, path, token, None).await
    }

    /// Send a multipart artifact upload.
    pub async fn upload(
        &self,
        token: &str,
        name: &str,
        version: &str,
        file: &[u8],
    ) -> Response<Body> {
        let (content_type, body) = multipart_body(name, version, file);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/artifacts")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("failed to build upload request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("upload request failed")
    }

    /// Register an account through the public endpoint.
    pub async fn register(&self, email: &str, password: &str) {
        let response = self
            .post_json(
                "/auth/register",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    /// Approve an account directly in the store, bypassing HTTP.
    pub async fn approve(&self, email: &str) {
        self.store
            .transition_account(email, AccountAction::Approve)
            .await
            .expect("failed to approve account");
    }

    /// Register and approve, ready to log in.
    pub async fn register_approved(&self, email: &str) {
        self.register(email, USER_PASSWORD).await;
        self.approve(email).await;
    }

    /// Run the password step of login and return the emailed OTP code.
    pub async fn login_and_get_otp(&self, email: &str, password: &str) -> String {
        let response = self
            .post_json(
                "/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let mail = self
            .mailbox
            .last_to(email)
            .expect("no OTP email delivered");
        extract_otp(&mail.body)
    }

    /// Full login: password, OTP, token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let otp = self.login_and_get_otp(email, password).await;

        let response = self
            .post_json(
                "/auth/verify-otp",
                None,
                json!({ "email": email, "otp": otp }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        body["access_token"]
            .as_str()
            .expect("missing access_token")
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }
}

/// Pull the 6-digit code out of an OTP email body.
pub fn extract_otp(body: &str) -> String {
    body.split("Your OTP is ")
        .nth(1)
        .expect("no OTP in email body")
        .chars()
        .take(6)
        .collect()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is not JSON")
}

/// Multipart form with `name`, `version`, and `file` fields.
pub fn multipart_body(name: &str, version: &str, file: &[u8]) -> (String, Vec<u8>) {
    let boundary = "registry-test-boundary";
    let mut body = Vec::new();

    for (field, value) in [("name", name), ("version", version)] {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload.bin\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={boundary}"), body)
}

fn test_config() -> RegistryConfig {
    RegistryConfig {
        common: service_core::config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "registry-service".to_string(),
        service_version: "test".to_string(),
        log_level: "warn".to_string(),
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            token_expiry_hours: 24,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            username: "noreply@localhost".to_string(),
            password: String::new(),
        },
        admin_email: ADMIN_EMAIL.to_string(),
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
    }
}
