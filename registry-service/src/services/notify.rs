//! Lifecycle notification composition and best-effort delivery.
//!
//! Every state transition notifies its owner by email, but a failed send
//! never rolls back or blocks the transition that triggered it: the
//! outcome is logged and the request proceeds. OTP delivery is NOT
//! handled here; its failure is surfaced to the caller because delivering
//! the code is the whole point of that operation.

use std::sync::Arc;

use crate::models::Artifact;
use crate::services::email::EmailProvider;
use crate::services::otp::OtpManager;

/// Send a notification, logging on failure instead of propagating.
pub async fn best_effort(email: &Arc<dyn EmailProvider>, to: &str, subject: &str, body: &str) {
    if let Err(e) = email.send(to, subject, body).await {
        tracing::warn!(
            to = %to,
            subject = %subject,
            error = %e,
            "Notification delivery failed; state transition stands"
        );
    }
}

/// Subject and body for an OTP delivery mail.
pub fn otp_message(code: &str) -> (String, String) {
    (
        "Software Registry OTP".to_string(),
        format!(
            "Your OTP is {}. It expires in {} minutes.",
            code,
            OtpManager::expiry_minutes()
        ),
    )
}

pub async fn registration_pending(email: &Arc<dyn EmailProvider>, to: &str) {
    best_effort(
        email,
        to,
        "Registration received",
        "Your account has been registered and is pending administrator approval. \
         You will be notified once a decision has been made.",
    )
    .await;
}

pub async fn admin_created(email: &Arc<dyn EmailProvider>, to: &str) {
    best_effort(
        email,
        to,
        "Administrator account created",
        "An administrator account has been created for this address. \
         You can log in immediately.",
    )
    .await;
}

pub async fn account_decision(email: &Arc<dyn EmailProvider>, to: &str, status: &str) {
    let body = match status {
        "approved" => "Your account has been approved. You can now log in.",
        "rejected" => "Your account has been rejected. Contact the administrator for details.",
        _ => "Your account has been archived and can no longer be used.",
    };
    best_effort(
        email,
        to,
        &format!("Account {}", status),
        body,
    )
    .await;
}

/// Unarchive gets its own notice; the restored standing's label would
/// read like a fresh decision.
pub async fn account_restored(email: &Arc<dyn EmailProvider>, to: &str) {
    best_effort(
        email,
        to,
        "Account restored",
        "Your account has been restored from the archive.",
    )
    .await;
}

pub async fn artifact_submitted(
    email: &Arc<dyn EmailProvider>,
    admin_mailbox: &str,
    artifact: &Artifact,
) {
    best_effort(
        email,
        admin_mailbox,
        "New software upload pending review",
        &format!(
            "{} {} was uploaded by {}.\nContent hash: {}\n\nReview it in the admin console.",
            artifact.name, artifact.version, artifact.developer_email, artifact.content_hash
        ),
    )
    .await;
}

pub async fn artifact_decided(email: &Arc<dyn EmailProvider>, artifact: &Artifact) {
    best_effort(
        email,
        &artifact.developer_email,
        &format!("Software {}", artifact.state.as_str()),
        &format!(
            "Your upload {} {} (hash {}) has been {}.",
            artifact.name,
            artifact.version,
            artifact.content_hash,
            artifact.state.as_str()
        ),
    )
    .await;
}
