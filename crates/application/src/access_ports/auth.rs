use amicale_core::{AppResult, UserIdentity};
use async_trait::async_trait;

/// Authentication provider port.
///
/// OTP generation and SMS delivery mechanics live entirely behind this
/// port; the application layer only sees the resulting identity.
#[async_trait]
pub trait AuthenticationProvider: Send + Sync {
    /// Issues a one-time code for the phone number, delivered out of band.
    async fn begin(&self, phone: &str) -> AppResult<()>;

    /// Verifies a one-time code and returns the authenticated identity.
    async fn verify(&self, phone: &str, code: &str) -> AppResult<UserIdentity>;
}
