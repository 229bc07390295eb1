use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use amicale_core::{AppError, AppResult, AssociationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::legacy::LegacyRole;
use crate::permission::PermissionId;
use crate::role::RoleId;

/// Membership identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MembershipId(Uuid);

impl MembershipId {
    /// Creates a random membership identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a membership identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a transport value into a membership identifier.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| AppError::NotFound(format!("membership '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MembershipId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for MembershipId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle state of a membership.
///
/// Deletion is modeled as the `Excluded` state; membership rows are never
/// hard-deleted and every query filters by status explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Join request awaiting admin review.
    Pending,
    /// Validated member.
    Active,
    /// Rejected or excluded member (soft delete).
    Excluded,
}

impl MembershipStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Excluded => "excluded",
        }
    }

    /// Parses a stored value into a status.
    pub fn from_storage(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "excluded" => Ok(Self::Excluded),
            _ => Err(AppError::Validation(format!(
                "unknown membership status '{value}'"
            ))),
        }
    }
}

/// Per-member grant/revoke overrides layered on top of role-derived
/// permissions.
///
/// The two sets are disjoint by construction: applying a grant removes the
/// id from `revoked` and vice versa, so the most recent override always
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverrides {
    /// Permissions granted directly to the member.
    pub granted: BTreeSet<PermissionId>,
    /// Permissions revoked directly from the member.
    pub revoked: BTreeSet<PermissionId>,
}

impl PermissionOverrides {
    /// Applies a grant, withdrawing any standing revoke for the same id.
    pub fn grant(&mut self, permission: PermissionId) {
        self.revoked.remove(&permission);
        self.granted.insert(permission);
    }

    /// Applies a revoke, withdrawing any standing grant for the same id.
    pub fn revoke(&mut self, permission: PermissionId) {
        self.granted.remove(&permission);
        self.revoked.insert(permission);
    }
}

/// One user's relationship to one association.
///
/// There is exactly one membership per (association, subject) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Stable membership identifier.
    pub membership_id: MembershipId,
    /// Owning association.
    pub association_id: AssociationId,
    /// Stable subject claim of the user.
    pub user_subject: String,
    /// Display name captured at join time.
    pub display_name: String,
    /// Association admin flag: one authority level above all roles.
    pub is_admin: bool,
    /// Roles assigned to the member; must reference roles of the same
    /// association, checked in application logic.
    pub assigned_roles: BTreeSet<RoleId>,
    /// Per-member permission overrides.
    pub overrides: PermissionOverrides,
    /// Legacy hierarchical role, populated only for associations on the
    /// legacy permission model.
    pub legacy_role: Option<LegacyRole>,
    /// Lifecycle state.
    pub status: MembershipStatus,
    /// Timestamp of the join request.
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    /// Creates a pending membership for a join request.
    #[must_use]
    pub fn join_request(
        association_id: AssociationId,
        user_subject: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            membership_id: MembershipId::new(),
            association_id,
            user_subject: user_subject.into(),
            display_name: display_name.into(),
            is_admin: false,
            assigned_roles: BTreeSet::new(),
            overrides: PermissionOverrides::default(),
            legacy_role: None,
            status: MembershipStatus::Pending,
            joined_at: Utc::now(),
        }
    }

    /// Returns whether the membership is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }

    /// Replaces the assigned role set.
    pub fn assign_roles(&mut self, roles: BTreeSet<RoleId>) {
        self.assigned_roles = roles;
    }

    /// Removes one role; removing an unassigned role is a no-op.
    pub fn remove_role(&mut self, role_id: RoleId) {
        self.assigned_roles.remove(&role_id);
    }

    /// Grants a permission directly to the member.
    pub fn grant(&mut self, permission: PermissionId) {
        self.overrides.grant(permission);
    }

    /// Revokes a permission directly from the member.
    pub fn revoke(&mut self, permission: PermissionId) {
        self.overrides.revoke(permission);
    }

    /// Transitions a pending membership to active.
    pub fn approve(&mut self) -> AppResult<()> {
        if self.status != MembershipStatus::Pending {
            return Err(AppError::Conflict(format!(
                "membership '{}' is not pending review",
                self.membership_id
            )));
        }

        self.status = MembershipStatus::Active;
        Ok(())
    }

    /// Excludes the member (soft delete).
    pub fn exclude(&mut self) {
        self.status = MembershipStatus::Excluded;
    }
}

#[cfg(test)]
mod tests {
    use amicale_core::AssociationId;

    use super::{Membership, MembershipStatus, PermissionOverrides};
    use crate::permission::PermissionId;

    fn permission(value: &str) -> PermissionId {
        PermissionId::new(value).unwrap_or_else(|_| unreachable!("valid test id"))
    }

    #[test]
    fn grant_then_revoke_leaves_permission_revoked() {
        let mut overrides = PermissionOverrides::default();
        overrides.grant(permission("view_finances"));
        overrides.revoke(permission("view_finances"));

        assert!(!overrides.granted.contains(&permission("view_finances")));
        assert!(overrides.revoked.contains(&permission("view_finances")));
    }

    #[test]
    fn revoke_then_grant_leaves_permission_granted() {
        let mut overrides = PermissionOverrides::default();
        overrides.revoke(permission("view_finances"));
        overrides.grant(permission("view_finances"));

        assert!(overrides.granted.contains(&permission("view_finances")));
        assert!(!overrides.revoked.contains(&permission("view_finances")));
    }

    #[test]
    fn join_request_starts_pending_without_authority() {
        let membership = Membership::join_request(AssociationId::new(), "user-1", "Awa");
        assert_eq!(membership.status, MembershipStatus::Pending);
        assert!(!membership.is_admin);
        assert!(membership.assigned_roles.is_empty());
    }

    #[test]
    fn approve_rejects_non_pending_membership() {
        let mut membership = Membership::join_request(AssociationId::new(), "user-1", "Awa");
        assert!(membership.approve().is_ok());
        assert!(membership.approve().is_err());
    }
}
