use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when an association role is created.
    RoleCreated,
    /// Emitted when an association role is updated.
    RoleUpdated,
    /// Emitted when an association role is deleted.
    RoleDeleted,
    /// Emitted when a member's role set is replaced.
    RolesAssigned,
    /// Emitted when one role is removed from a member.
    RoleRemoved,
    /// Emitted when a permission is granted directly to a member.
    PermissionGranted,
    /// Emitted when a permission is revoked directly from a member.
    PermissionRevokedFromMember,
    /// Emitted when admin authority is transferred.
    AdminTransferred,
    /// Emitted when a join request is created.
    MemberJoinRequested,
    /// Emitted when a join request is approved.
    MemberApproved,
    /// Emitted when a member is rejected or excluded.
    MemberExcluded,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "role.created",
            Self::RoleUpdated => "role.updated",
            Self::RoleDeleted => "role.deleted",
            Self::RolesAssigned => "member.roles_assigned",
            Self::RoleRemoved => "member.role_removed",
            Self::PermissionGranted => "member.permission_granted",
            Self::PermissionRevokedFromMember => "member.permission_revoked",
            Self::AdminTransferred => "association.admin_transferred",
            Self::MemberJoinRequested => "member.join_requested",
            Self::MemberApproved => "member.approved",
            Self::MemberExcluded => "member.excluded",
        }
    }
}
