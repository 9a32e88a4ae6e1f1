//! One-time passcode issuance and verification.
//!
//! At most one outstanding challenge per email; issuing again replaces the
//! previous code. Verification consumes the code on success, enforces the
//! expiry window server-side, and caps failed attempts so the 6-digit
//! space cannot be enumerated. Issue-replace and verify-consume hold the
//! map entry for the whole check, making both atomic per email.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use std::sync::Arc;
use thiserror::Error;

const OTP_LENGTH: usize = 6;
pub const OTP_EXPIRY_SECONDS: i64 = 300; // 5 minutes
const OTP_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("Invalid OTP")]
    Invalid,

    #[error("OTP has expired")]
    Expired,

    #[error("Maximum verification attempts exceeded")]
    TooManyAttempts,
}

#[derive(Debug, Clone)]
struct OtpChallenge {
    code: String,
    issued_utc: DateTime<Utc>,
    attempts: u32,
}

#[derive(Clone)]
pub struct OtpManager {
    challenges: Arc<DashMap<String, OtpChallenge>>,
    ttl: Duration,
}

impl Default for OtpManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OtpManager {
    pub fn new() -> Self {
        Self::with_ttl(Duration::seconds(OTP_EXPIRY_SECONDS))
    }

    /// Custom validity window, used by tests to exercise expiry.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            challenges: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Generate and stage a fresh code, replacing any outstanding
    /// challenge for this email. The caller is responsible for delivery
    /// and for gating the account beforehand.
    pub fn issue(&self, email: &str) -> String {
        let code = generate_otp(OTP_LENGTH);
        self.challenges.insert(
            email.to_string(),
            OtpChallenge {
                code: code.clone(),
                issued_utc: Utc::now(),
                attempts: 0,
            },
        );
        code
    }

    /// Check a submitted code. Success is single-use; a mismatch leaves
    /// the challenge in place until the attempt cap is reached.
    pub fn verify(&self, email: &str, submitted: &str) -> Result<(), OtpError> {
        match self.challenges.entry(email.to_string()) {
            Entry::Vacant(_) => Err(OtpError::Invalid),
            Entry::Occupied(mut occupied) => {
                if Utc::now() - occupied.get().issued_utc > self.ttl {
                    occupied.remove();
                    return Err(OtpError::Expired);
                }
                if occupied.get().code == submitted {
                    occupied.remove();
                    return Ok(());
                }
                occupied.get_mut().attempts += 1;
                if occupied.get().attempts >= OTP_MAX_ATTEMPTS {
                    occupied.remove();
                    return Err(OtpError::TooManyAttempts);
                }
                Err(OtpError::Invalid)
            }
        }
    }

    pub fn expiry_minutes() -> i64 {
        OTP_EXPIRY_SECONDS / 60
    }
}

/// Random numeric code from the thread-local CSPRNG.
fn generate_otp(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| rng.gen_range(0..10).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_code_is_six_digits() {
        let manager = OtpManager::new();
        let code = manager.issue("a@b.com");
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn verify_consumes_the_code() {
        let manager = OtpManager::new();
        let code = manager.issue("a@b.com");

        assert_eq!(manager.verify("a@b.com", &code), Ok(()));
        // Single use: the same correct code fails the second time.
        assert_eq!(manager.verify("a@b.com", &code), Err(OtpError::Invalid));
    }

    #[test]
    fn reissue_invalidates_the_previous_code() {
        let manager = OtpManager::new();
        let first = manager.issue("a@b.com");
        let second = manager.issue("a@b.com");

        if first != second {
            assert_eq!(manager.verify("a@b.com", &first), Err(OtpError::Invalid));
        }
        assert_eq!(manager.verify("a@b.com", &second), Ok(()));
    }

    #[test]
    fn mismatch_does_not_consume_until_attempts_run_out() {
        let manager = OtpManager::new();
        let code = manager.issue("a@b.com");

        assert_eq!(manager.verify("a@b.com", "000000x"), Err(OtpError::Invalid));
        // Still valid after a failed guess.
        assert_eq!(manager.verify("a@b.com", &code), Ok(()));
    }

    #[test]
    fn attempt_cap_consumes_the_challenge() {
        let manager = OtpManager::new();
        let code = manager.issue("a@b.com");

        for _ in 0..4 {
            assert_eq!(manager.verify("a@b.com", "no"), Err(OtpError::Invalid));
        }
        assert_eq!(
            manager.verify("a@b.com", "no"),
            Err(OtpError::TooManyAttempts)
        );
        // Gone entirely, even for the correct code.
        assert_eq!(manager.verify("a@b.com", &code), Err(OtpError::Invalid));
    }

    #[test]
    fn expired_codes_are_rejected_and_removed() {
        let manager = OtpManager::with_ttl(Duration::milliseconds(-1));
        let code = manager.issue("a@b.com");

        assert_eq!(manager.verify("a@b.com", &code), Err(OtpError::Expired));
        assert_eq!(manager.verify("a@b.com", &code), Err(OtpError::Invalid));
    }

    #[test]
    fn unknown_email_is_invalid() {
        let manager = OtpManager::new();
        assert_eq!(manager.verify("a@b.com", "123456"), Err(OtpError::Invalid));
    }
}
