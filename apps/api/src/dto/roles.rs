use amicale_application::MemberRolesView;
use amicale_domain::{PermissionDefinition, Role};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::MembershipResponse;

/// Incoming payload for role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_unique: Option<bool>,
}

/// Incoming payload for partial role updates.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_unique: Option<bool>,
}

/// API representation of an association role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_unique: bool,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            role_id: role.role_id.to_string(),
            name: role.name,
            description: role.description,
            permissions: role
                .permissions
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
            color: role.color,
            icon: role.icon,
            is_unique: role.is_unique,
        }
    }
}

/// Incoming payload replacing a member's assigned role set.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/assign-roles-request.ts"
)]
pub struct AssignRolesRequest {
    pub role_ids: Vec<String>,
}

/// Incoming payload granting or revoking one permission on a member.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-override-request.ts"
)]
pub struct PermissionOverrideRequest {
    pub permission: String,
}

/// Incoming payload for the admin transfer.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/transfer-admin-request.ts"
)]
pub struct TransferAdminRequest {
    pub member_id: String,
}

/// Role definitions and effective permission set of one member.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/member-roles-response.ts"
)]
pub struct MemberRolesResponse {
    pub membership: MembershipResponse,
    pub roles: Vec<RoleResponse>,
    pub effective_permissions: Vec<String>,
}

impl From<MemberRolesView> for MemberRolesResponse {
    fn from(view: MemberRolesView) -> Self {
        Self {
            membership: MembershipResponse::from(view.membership),
            roles: view.roles.into_iter().map(RoleResponse::from).collect(),
            effective_permissions: view
                .effective_permissions
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
        }
    }
}

/// API representation of one permission catalog entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-definition-response.ts"
)]
pub struct PermissionDefinitionResponse {
    pub id: String,
    pub display_name: String,
    pub description: String,
}

/// One catalog category with its permissions, for grouped display.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/catalog-category-response.ts"
)]
pub struct CatalogCategoryResponse {
    pub category: String,
    pub permissions: Vec<PermissionDefinitionResponse>,
}

impl CatalogCategoryResponse {
    /// Groups an ordered catalog into category buckets, preserving order.
    #[must_use]
    pub fn group(catalog: Vec<PermissionDefinition>) -> Vec<Self> {
        let mut groups: Vec<Self> = Vec::new();
        for definition in catalog {
            let category = definition.category.as_str();
            let entry = PermissionDefinitionResponse {
                id: definition.id.as_str().to_owned(),
                display_name: definition.display_name,
                description: definition.description,
            };

            match groups.last_mut() {
                Some(group) if group.category == category => group.permissions.push(entry),
                _ => groups.push(Self {
                    category: category.to_owned(),
                    permissions: vec![entry],
                }),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use amicale_domain::default_catalog;

    use super::CatalogCategoryResponse;

    #[test]
    fn grouping_keeps_category_order_and_every_entry() {
        let catalog = default_catalog();
        let total = catalog.len();

        let groups = CatalogCategoryResponse::group(catalog);
        let grouped: usize = groups.iter().map(|group| group.permissions.len()).sum();
        assert_eq!(grouped, total);

        let mut seen = Vec::new();
        for group in &groups {
            assert!(!seen.contains(&group.category), "category split across groups");
            seen.push(group.category.clone());
        }
    }
}
