mod common;

use axum::http::StatusCode;
use serde_json::json;
use sha2::{Digest, Sha256};

use common::{json_body, TestApp, ADMIN_EMAIL, USER_PASSWORD};

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[tokio::test]
async fn upload_stores_the_artifact_under_its_content_hash() {
    let app = TestApp::spawn().await;
    app.register_approved("dev@example.com").await;
    let token = app.login("dev@example.com", USER_PASSWORD).await;

    let payload = b"binary payload v1";
    let response = app.upload(&token, "media-player", "1.0.0", payload).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["name"], "media-player");
    assert_eq!(body["version"], "1.0.0");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["developer_email"], "dev@example.com");
    assert_eq!(body["content_hash"], sha256_hex(payload));

    // The admin mailbox was notified of the pending upload
    let mail = app.mailbox.last_to(ADMIN_EMAIL).unwrap();
    assert!(mail.body.contains("media-player"));
    assert!(mail.body.contains(&sha256_hex(payload)));
}

#[tokio::test]
async fn identical_content_conflicts_regardless_of_metadata_or_uploader() {
    let app = TestApp::spawn().await;
    app.register_approved("alice@example.com").await;
    app.register_approved("bob@example.com").await;

    let alice = app.login("alice@example.com", USER_PASSWORD).await;
    let bob = app.login("bob@example.com", USER_PASSWORD).await;

    let payload = b"same bytes";
    let first = app.upload(&alice, "tool", "1.0", payload).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    // Different name, version, and uploader; same bytes
    let second = app.upload(&bob, "other-tool", "9.9", payload).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    // Different bytes go through
    let third = app.upload(&bob, "other-tool", "9.9", b"other bytes").await;
    assert_eq!(third.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn rejected_content_still_blocks_reupload() {
    let app = TestApp::spawn().await;
    app.register_approved("dev@example.com").await;
    let token = app.login("dev@example.com", USER_PASSWORD).await;
    let admin = app.admin_token().await;

    let payload = b"cracked.exe";
    let hash = sha256_hex(payload);

    let upload = app.upload(&token, "suspect", "1.0", payload).await;
    assert_eq!(upload.status(), StatusCode::CREATED);

    let rejected = app
        .post_json(
            &format!("/admin/artifacts/{}/reject", hash),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(rejected.status(), StatusCode::OK);
    assert_eq!(json_body(rejected).await["status"], "rejected");

    // The developer was told
    let mail = app.mailbox.last_to("dev@example.com").unwrap();
    assert_eq!(mail.subject, "Software rejected");

    // The hash stays on record, so the same bytes cannot come back
    let again = app.upload(&token, "renamed", "2.0", payload).await;
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn decided_artifacts_are_immutable() {
    let app = TestApp::spawn().await;
    app.register_approved("dev@example.com").await;
    let token = app.login("dev@example.com", USER_PASSWORD).await;
    let admin = app.admin_token().await;

    let payload = b"good tool";
    let hash = sha256_hex(payload);
    app.upload(&token, "tool", "1.0", payload).await;

    let approved = app
        .post_json(
            &format!("/admin/artifacts/{}/approve", hash),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(approved.status(), StatusCode::OK);

    let flipped = app
        .post_json(
            &format!("/admin/artifacts/{}/reject", hash),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(flipped.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn deciding_an_unknown_hash_is_not_found() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let response = app
        .post_json(
            &format!("/admin/artifacts/{}/approve", sha256_hex(b"never uploaded")),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn own_uploads_are_listable_with_state_filter() {
    let app = TestApp::spawn().await;
    app.register_approved("dev@example.com").await;
    let token = app.login("dev@example.com", USER_PASSWORD).await;
    let admin = app.admin_token().await;

    app.upload(&token, "one", "1.0", b"payload one").await;
    app.upload(&token, "two", "1.0", b"payload two").await;
    app.post_json(
        &format!("/admin/artifacts/{}/approve", sha256_hex(b"payload one")),
        Some(&admin),
        json!({}),
    )
    .await;

    let mine = app.get("/artifacts/mine", Some(&token)).await;
    assert_eq!(json_body(mine).await.as_array().unwrap().len(), 2);

    let approved_only = app.get("/artifacts/mine?state=approved", Some(&token)).await;
    let body = json_body(approved_only).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "one");

    let invalid = app.get("/artifacts/mine?state=archived", Some(&token)).await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn approved_listing_spans_all_developers() {
    let app = TestApp::spawn().await;
    app.register_approved("alice@example.com").await;
    app.register_approved("bob@example.com").await;
    let alice = app.login("alice@example.com", USER_PASSWORD).await;
    let bob = app.login("bob@example.com", USER_PASSWORD).await;
    let admin = app.admin_token().await;

    app.upload(&alice, "alices-tool", "1.0", b"alice bytes").await;
    app.upload(&bob, "bobs-tool", "1.0", b"bob bytes").await;
    app.post_json(
        &format!("/admin/artifacts/{}/approve", sha256_hex(b"alice bytes")),
        Some(&admin),
        json!({}),
    )
    .await;

    // Bob sees Alice's approved artifact, but not his own pending one
    let listing = app.get("/artifacts/approved", Some(&bob)).await;
    let body = json_body(listing).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "alices-tool");
}

#[tokio::test]
async fn admin_review_queue_lists_pending_artifacts() {
    let app = TestApp::spawn().await;
    app.register_approved("dev@example.com").await;
    let token = app.login("dev@example.com", USER_PASSWORD).await;
    let admin = app.admin_token().await;

    app.upload(&token, "tool", "1.0", b"pending bytes").await;

    let pending = app.get("/admin/artifacts?state=pending", Some(&admin)).await;
    let body = json_body(pending).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["content_hash"], sha256_hex(b"pending bytes"));

    let everything = app.get("/admin/artifacts", Some(&admin)).await;
    assert_eq!(json_body(everything).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn upload_requires_a_currently_available_account() {
    let app = TestApp::spawn().await;
    app.register_approved("dev@example.com").await;
    let token = app.login("dev@example.com", USER_PASSWORD).await;
    let admin = app.admin_token().await;

    // Archive after the token was issued; the gate checks current state
    app.post_json(
        "/admin/accounts/dev@example.com/archive",
        Some(&admin),
        json!({}),
    )
    .await;

    let response = app.upload(&token, "tool", "1.0", b"bytes").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Account not available");
}

#[tokio::test]
async fn uploads_missing_a_field_are_bad_requests() {
    let app = TestApp::spawn().await;
    app.register_approved("dev@example.com").await;
    let token = app.login("dev@example.com", USER_PASSWORD).await;

    // Multipart body with no file field
    let boundary = "registry-test-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\ntool\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"version\"\r\n\r\n1.0\r\n\
         --{boundary}--\r\n"
    );

    let request = axum::http::Request::builder()
        .method(axum::http::Method::POST)
        .uri("/artifacts")
        .header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", token),
        )
        .header(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(axum::body::Body::from(body))
        .unwrap();

    let response = tower::util::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "Missing required field: file");
}
