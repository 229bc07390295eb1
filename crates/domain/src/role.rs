use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use amicale_core::{AppError, AppResult, AssociationId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permission::PermissionId;

/// Role identifier, unique within an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a transport value into a role identifier.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| AppError::RoleNotFound(value.to_owned()))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A named, reusable bundle of permissions scoped to one association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub role_id: RoleId,
    /// Owning association.
    pub association_id: AssociationId,
    /// Name, unique within the association (case-sensitive exact match).
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Permissions the role carries; always a subset of the association
    /// catalog, enforced at creation and update.
    pub permissions: BTreeSet<PermissionId>,
    /// Display color used by clients.
    pub color: Option<String>,
    /// Display icon used by clients.
    pub icon: Option<String>,
    /// When true, at most one active member may hold this role at a time.
    /// Enforced at assignment time, not at definition time.
    pub is_unique: bool,
}

impl Role {
    /// Validates role field invariants shared by create and update paths.
    pub fn validate_name(name: &str) -> AppResult<()> {
        if name.trim().is_empty() {
            return Err(AppError::Validation("role name must not be empty".to_owned()));
        }
        if name.len() > 80 {
            return Err(AppError::Validation(
                "role name must be at most 80 characters".to_owned(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, RoleId};

    #[test]
    fn role_name_validation_bounds() {
        assert!(Role::validate_name("Trésorier").is_ok());
        assert!(Role::validate_name("  ").is_err());
        assert!(Role::validate_name(&"x".repeat(81)).is_err());
    }

    #[test]
    fn malformed_role_id_maps_to_role_not_found() {
        assert!(RoleId::parse("not-a-role").is_err());
    }
}
