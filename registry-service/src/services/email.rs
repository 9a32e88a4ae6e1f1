//! Outbound email, behind the notifier contract.
//!
//! `EmailService` sends through SMTP via lettre; `MockEmailService`
//! captures messages for tests. Delivery is best-effort: callers decide
//! whether a failure is fatal (OTP delivery) or merely logged (lifecycle
//! notifications).

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::SmtpConfig;
use crate::services::error::ServiceError;
use service_core::error::AppError;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<(), ServiceError>;
}

#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from_email: String,
}

impl EmailService {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Email service initialized");

        Ok(Self {
            mailer,
            from_email: config.username.clone(),
        })
    }
}

#[async_trait]
impl EmailProvider for EmailService {
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<(), ServiceError> {
        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| ServiceError::Email(e.to_string()))?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| ServiceError::Email(e.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| ServiceError::Email(e.to_string()))?;

        // Send in the blocking pool to keep the async runtime free
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| ServiceError::Email(e.to_string()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e.to_string(), to = %to_email, "Failed to send email");
                Err(ServiceError::Email(e.to_string()))
            }
        }
    }
}

/// A message captured by `MockEmailService`.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct MockEmailService {
    sent: Arc<Mutex<Vec<SentEmail>>>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().expect("mailbox poisoned").clone()
    }

    /// Most recent message delivered to an address, if any.
    pub fn last_to(&self, to_email: &str) -> Option<SentEmail> {
        self.sent
            .lock()
            .expect("mailbox poisoned")
            .iter()
            .rev()
            .find(|m| m.to == to_email)
            .cloned()
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<(), ServiceError> {
        self.sent.lock().expect("mailbox poisoned").push(SentEmail {
            to: to_email.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_service_creation() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "noreply@example.com".to_string(),
            password: "app-password".to_string(),
        };

        assert!(EmailService::new(&config).is_ok());
    }

    #[tokio::test]
    async fn mock_captures_messages() {
        let mock = MockEmailService::new();
        mock.send("a@b.com", "Subject", "Body").await.unwrap();

        let last = mock.last_to("a@b.com").unwrap();
        assert_eq!(last.subject, "Subject");
        assert_eq!(last.body, "Body");
        assert!(mock.last_to("c@d.com").is_none());
    }
}
