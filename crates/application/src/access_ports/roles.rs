use std::collections::BTreeSet;

use amicale_core::{AppResult, AssociationId};
use amicale_domain::{PermissionId, Role, RoleId};
use async_trait::async_trait;

/// Input payload for role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Role name, unique within the association (case-sensitive).
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Permissions to attach; must be a subset of the catalog.
    pub permissions: BTreeSet<PermissionId>,
    /// Display color.
    pub color: Option<String>,
    /// Display icon.
    pub icon: Option<String>,
    /// At most one holder at a time when true.
    pub is_unique: bool,
}

/// Partial update payload for roles; only supplied fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New role name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Replacement permission set; validity is re-checked.
    pub permissions: Option<BTreeSet<PermissionId>>,
    /// New display color.
    pub color: Option<String>,
    /// New display icon.
    pub icon: Option<String>,
    /// New uniqueness flag.
    pub is_unique: Option<bool>,
}

/// Repository port for association role definitions.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Lists the roles of an association.
    async fn list_roles(&self, association_id: AssociationId) -> AppResult<Vec<Role>>;

    /// Finds a role by identifier.
    async fn find_role(
        &self,
        association_id: AssociationId,
        role_id: RoleId,
    ) -> AppResult<Option<Role>>;

    /// Inserts a role; surfaces a name collision as `DuplicateRoleName`.
    async fn insert_role(&self, role: &Role) -> AppResult<()>;

    /// Persists an updated role definition.
    async fn update_role(&self, role: &Role) -> AppResult<()>;

    /// Deletes a role.
    ///
    /// Without `force`, fails with `RoleInUse` when any non-excluded
    /// membership still references the role, mutating nothing. With
    /// `force`, strips the role from every membership and deletes the
    /// definition in one transaction.
    async fn delete_role(
        &self,
        association_id: AssociationId,
        role_id: RoleId,
        force: bool,
    ) -> AppResult<()>;
}
