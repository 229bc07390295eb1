use serde::{Deserialize, Serialize};

/// User information persisted in the authenticated session.
///
/// Carries no association context: the tenant an actor operates on always
/// comes from the request path and is re-resolved against the membership
/// store on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    display_name: String,
    phone: Option<String>,
}

impl UserIdentity {
    /// Creates a user identity from authentication provider data.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            phone,
        }
    }

    /// Returns the stable subject claim from the authentication provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the phone number, if the provider returned one.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}
