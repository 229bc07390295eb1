//! Console OTP provider for development. Logs codes to tracing output
//! instead of sending SMS.

use std::collections::HashMap;
use std::sync::Arc;

use amicale_application::AuthenticationProvider;
use amicale_core::{AppError, AppResult, UserIdentity};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info};

const CODE_TTL_MINUTES: i64 = 5;

struct PendingCode {
    code: String,
    expires_at: DateTime<Utc>,
}

/// Development authentication provider that prints one-time codes to the
/// console. Codes live in process memory and expire after five minutes.
#[derive(Clone, Default)]
pub struct ConsoleOtpProvider {
    pending: Arc<Mutex<HashMap<String, PendingCode>>>,
}

impl ConsoleOtpProvider {
    /// Creates a new console OTP provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(phone: &str) -> AppResult<String> {
        let trimmed = phone.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("phone number must not be empty".to_owned()));
        }
        Ok(trimmed.to_owned())
    }
}

#[async_trait]
impl AuthenticationProvider for ConsoleOtpProvider {
    async fn begin(&self, phone: &str) -> AppResult<()> {
        let phone = Self::normalize(phone)?;
        let code = format!("{:06}", rand::rng().random_range(0..1_000_000));

        info!(
            phone = phone.as_str(),
            "--- OTP (console) ---\nPhone: {}\nCode: {}\n--- END OTP ---", phone, code
        );

        self.pending.lock().await.insert(
            phone,
            PendingCode {
                code,
                expires_at: Utc::now() + Duration::minutes(CODE_TTL_MINUTES),
            },
        );

        Ok(())
    }

    async fn verify(&self, phone: &str, code: &str) -> AppResult<UserIdentity> {
        let phone = Self::normalize(phone)?;
        let mut pending = self.pending.lock().await;

        let Some(entry) = pending.get(&phone) else {
            debug!(phone = phone.as_str(), "no pending code for this phone");
            return Err(AppError::NotAuthenticated);
        };

        if entry.expires_at < Utc::now() {
            pending.remove(&phone);
            debug!(phone = phone.as_str(), "one-time code expired");
            return Err(AppError::NotAuthenticated);
        }
        if entry.code != code {
            debug!(phone = phone.as_str(), "one-time code mismatch");
            return Err(AppError::NotAuthenticated);
        }

        pending.remove(&phone);
        Ok(UserIdentity::new(
            format!("phone:{phone}"),
            phone.clone(),
            Some(phone),
        ))
    }
}

#[cfg(test)]
mod tests {
    use amicale_application::AuthenticationProvider;
    use amicale_core::AppError;

    use super::ConsoleOtpProvider;

    #[tokio::test]
    async fn rejects_verification_without_a_pending_code() {
        let provider = ConsoleOtpProvider::new();
        let result = provider.verify("+221770000000", "123456").await;
        assert!(matches!(result, Err(AppError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn rejects_wrong_codes_but_keeps_the_pending_entry() {
        let provider = ConsoleOtpProvider::new();
        provider
            .begin("+221770000000")
            .await
            .unwrap_or_else(|error| panic!("begin failed: {error}"));

        let wrong = provider.verify("+221770000000", "000000").await;
        let code = provider
            .pending
            .lock()
            .await
            .get("+221770000000")
            .map(|entry| entry.code.clone());

        // A wrong guess may coincide with the generated code; skip then.
        if code.as_deref() != Some("000000") {
            assert!(matches!(wrong, Err(AppError::NotAuthenticated)));
        }
        assert!(code.is_some());
    }

    #[tokio::test]
    async fn correct_code_yields_an_identity_and_consumes_the_entry() {
        let provider = ConsoleOtpProvider::new();
        provider
            .begin("+221770000000")
            .await
            .unwrap_or_else(|error| panic!("begin failed: {error}"));

        let code = provider
            .pending
            .lock()
            .await
            .get("+221770000000")
            .map(|entry| entry.code.clone())
            .unwrap_or_default();

        let identity = provider
            .verify("+221770000000", &code)
            .await
            .unwrap_or_else(|error| panic!("verify failed: {error}"));
        assert_eq!(identity.subject(), "phone:+221770000000");

        let retry = provider.verify("+221770000000", &code).await;
        assert!(retry.is_err());
    }
}
