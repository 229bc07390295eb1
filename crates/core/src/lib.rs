//! Shared primitives for all Rust crates in Amicale.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::UserIdentity;

/// Result type used across Amicale crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Association identifier used as the tenant partition key for every
/// persisted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssociationId(Uuid);

impl AssociationId {
    /// Creates a random association identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an association identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a path or transport value into an association identifier.
    pub fn parse(value: &str) -> AppResult<Self> {
        if value.trim().is_empty() {
            return Err(AppError::MissingAssociationId);
        }

        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| AppError::InvalidAssociationId(value.to_owned()))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AssociationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AssociationId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
///
/// Variants carry enough structure for the API layer to derive the stable
/// error code and HTTP status without re-parsing messages.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// The request carried no association context.
    #[error("association id is required")]
    MissingAssociationId,

    /// The association identifier was present but malformed.
    #[error("invalid association id '{0}'")]
    InvalidAssociationId(String),

    /// No authenticated actor on the request.
    #[error("authentication required")]
    NotAuthenticated,

    /// Actor has no active membership in the association.
    #[error("no active membership in association '{0}'")]
    NotAssociationMember(String),

    /// Target of an operation must be an active membership.
    #[error("membership '{0}' is not active")]
    MembershipRequired(String),

    /// Operation is reserved to the association admin.
    #[error("{0}")]
    AdminOnly(String),

    /// Actor lacks a required permission.
    #[error("missing permission '{permission}'")]
    InsufficientPermissions {
        /// Permission the operation requires.
        permission: String,
        /// Role names the actor currently holds (self-information only).
        current_roles: Vec<String>,
    },

    /// Permission is explicitly revoked on the actor's membership.
    #[error("permission '{0}' is revoked for this member")]
    PermissionRevoked(String),

    /// Referenced role does not exist in the association.
    #[error("role '{0}' was not found")]
    RoleNotFound(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Role is still assigned and cannot be deleted without force.
    #[error("role '{0}' is still assigned to members")]
    RoleInUse(String),

    /// Role name collides within the association.
    #[error("a role named '{0}' already exists in this association")]
    DuplicateRoleName(String),

    /// Referenced permission is not part of the association catalog.
    #[error("permission '{0}' is not in the association catalog")]
    InvalidPermission(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the stable machine-readable error code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::MissingAssociationId => "MISSING_ASSOCIATION_ID",
            Self::InvalidAssociationId(_) => "INVALID_ASSOCIATION_ID",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::NotAssociationMember(_) => "NOT_ASSOCIATION_MEMBER",
            Self::MembershipRequired(_) => "MEMBERSHIP_REQUIRED",
            Self::AdminOnly(_) => "ADMIN_ONLY",
            Self::InsufficientPermissions { .. } => "INSUFFICIENT_PERMISSIONS",
            Self::PermissionRevoked(_) => "PERMISSION_REVOKED",
            Self::RoleNotFound(_) => "ROLE_NOT_FOUND",
            Self::NotFound(_) => "NOT_FOUND",
            Self::RoleInUse(_) => "ROLE_IN_USE",
            Self::DuplicateRoleName(_) => "DUPLICATE_ROLE_NAME",
            Self::InvalidPermission(_) => "INVALID_PERMISSION",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
