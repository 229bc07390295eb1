use super::*;

use amicale_domain::AuditAction;

use crate::access_ports::{CreateRoleInput, UpdateRoleInput};

impl RoleAdminService {
    /// Returns the association roles for administrative users.
    pub async fn list_roles(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
    ) -> AppResult<Vec<Role>> {
        self.access
            .require_admin(association_id, actor.subject())
            .await?;
        self.role_repository.list_roles(association_id).await
    }

    /// Creates a role and emits an audit event.
    pub async fn create_role(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
        input: CreateRoleInput,
    ) -> AppResult<Role> {
        self.access
            .require_admin(association_id, actor.subject())
            .await?;

        Role::validate_name(&input.name)?;
        self.ensure_permissions_in_catalog(association_id, &input.permissions)
            .await?;

        let role = Role {
            role_id: RoleId::new(),
            association_id,
            name: input.name,
            description: input.description,
            permissions: input.permissions,
            color: input.color,
            icon: input.icon,
            is_unique: input.is_unique,
        };
        self.role_repository.insert_role(&role).await?;

        self.append_audit(
            association_id,
            actor,
            AuditAction::RoleCreated,
            "association_role",
            role.role_id.to_string(),
            format!("created role '{}'", role.name),
        )
        .await?;

        Ok(role)
    }

    /// Applies a partial role update; only supplied fields change and
    /// permission validity is re-checked.
    pub async fn update_role(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
        role_id: RoleId,
        input: UpdateRoleInput,
    ) -> AppResult<Role> {
        self.access
            .require_admin(association_id, actor.subject())
            .await?;

        let mut role = self.load_role(association_id, role_id).await?;

        if let Some(name) = input.name {
            Role::validate_name(&name)?;
            role.name = name;
        }
        if let Some(description) = input.description {
            role.description = description;
        }
        if let Some(permissions) = input.permissions {
            self.ensure_permissions_in_catalog(association_id, &permissions)
                .await?;
            role.permissions = permissions;
        }
        if let Some(color) = input.color {
            role.color = Some(color);
        }
        if let Some(icon) = input.icon {
            role.icon = Some(icon);
        }
        if let Some(is_unique) = input.is_unique {
            role.is_unique = is_unique;
        }

        self.role_repository.update_role(&role).await?;
        // Holders of this role resolve against the new permission set.
        self.access.invalidate_association(association_id).await;

        self.append_audit(
            association_id,
            actor,
            AuditAction::RoleUpdated,
            "association_role",
            role.role_id.to_string(),
            format!("updated role '{}'", role.name),
        )
        .await?;

        Ok(role)
    }

    /// Deletes a role; `force` cascades the removal from every membership,
    /// otherwise a still-assigned role fails with `RoleInUse`.
    pub async fn delete_role(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
        role_id: RoleId,
        force: bool,
    ) -> AppResult<()> {
        self.access
            .require_admin(association_id, actor.subject())
            .await?;

        let role = self.load_role(association_id, role_id).await?;
        self.role_repository
            .delete_role(association_id, role_id, force)
            .await?;
        self.access.invalidate_association(association_id).await;

        self.append_audit(
            association_id,
            actor,
            AuditAction::RoleDeleted,
            "association_role",
            role_id.to_string(),
            format!("deleted role '{}' (force={force})", role.name),
        )
        .await
    }
}
