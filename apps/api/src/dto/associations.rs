use amicale_domain::{Association, Membership, PermissionId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for association creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-association-request.ts"
)]
pub struct CreateAssociationRequest {
    pub name: String,
    /// `"catalog"` (default) or `"legacy"`.
    pub permission_model: Option<String>,
}

/// API representation of an association.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/association-response.ts"
)]
pub struct AssociationResponse {
    pub association_id: String,
    pub name: String,
    pub permission_model: String,
}

impl From<Association> for AssociationResponse {
    fn from(association: Association) -> Self {
        Self {
            association_id: association.association_id.to_string(),
            name: association.name,
            permission_model: association.permission_model.as_str().to_owned(),
        }
    }
}

/// Incoming payload reviewing a pending join request.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/review-join-request.ts"
)]
pub struct ReviewJoinRequest {
    pub approve: bool,
}

/// API representation of one membership record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/membership-response.ts"
)]
pub struct MembershipResponse {
    pub membership_id: String,
    pub association_id: String,
    pub subject: String,
    pub display_name: String,
    pub is_admin: bool,
    pub assigned_roles: Vec<String>,
    pub granted: Vec<String>,
    pub revoked: Vec<String>,
    pub legacy_role: Option<String>,
    pub status: String,
    pub joined_at: String,
}

impl From<Membership> for MembershipResponse {
    fn from(membership: Membership) -> Self {
        Self {
            membership_id: membership.membership_id.to_string(),
            association_id: membership.association_id.to_string(),
            subject: membership.user_subject,
            display_name: membership.display_name,
            is_admin: membership.is_admin,
            assigned_roles: membership
                .assigned_roles
                .iter()
                .map(ToString::to_string)
                .collect(),
            granted: permission_strings(membership.overrides.granted.iter()),
            revoked: permission_strings(membership.overrides.revoked.iter()),
            legacy_role: membership.legacy_role.map(|role| role.as_str().to_owned()),
            status: membership.status.as_str().to_owned(),
            joined_at: membership.joined_at.to_rfc3339(),
        }
    }
}

fn permission_strings<'a>(permissions: impl Iterator<Item = &'a PermissionId>) -> Vec<String> {
    permissions.map(|value| value.as_str().to_owned()).collect()
}
