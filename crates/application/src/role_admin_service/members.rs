use super::*;

use amicale_domain::AuditAction;

/// Role definitions and effective permissions of one member, as returned
/// by the admin-or-self view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRolesView {
    /// The membership the view describes.
    pub membership: Membership,
    /// Definitions of the currently assigned roles.
    pub roles: Vec<Role>,
    /// Full effective permission set.
    pub effective_permissions: BTreeSet<PermissionId>,
}

impl RoleAdminService {
    /// Replaces a member's assigned role set.
    ///
    /// Every requested role must exist in the association. Roles flagged
    /// unique evict any other holder inside the same transaction.
    pub async fn assign_roles(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
        member_id: MembershipId,
        role_ids: Vec<RoleId>,
    ) -> AppResult<Membership> {
        self.access
            .require_admin(association_id, actor.subject())
            .await?;

        let target = self.load_target_member(association_id, member_id).await?;
        if !target.is_active() {
            return Err(AppError::MembershipRequired(member_id.to_string()));
        }

        let mut unique_roles = Vec::new();
        for role_id in &role_ids {
            let role = self.load_role(association_id, *role_id).await?;
            if role.is_unique {
                unique_roles.push(role.role_id);
            }
        }

        let roles: BTreeSet<RoleId> = role_ids.into_iter().collect();
        let updated = self
            .membership_repository
            .replace_roles_with_eviction(association_id, member_id, roles, unique_roles)
            .await?;
        self.access.invalidate_association(association_id).await;

        self.append_audit(
            association_id,
            actor,
            AuditAction::RolesAssigned,
            "association_membership",
            member_id.to_string(),
            format!(
                "assigned {} role(s) to '{}'",
                updated.assigned_roles.len(),
                updated.user_subject
            ),
        )
        .await?;

        Ok(updated)
    }

    /// Removes one role from a member. Removing an unassigned role is a
    /// no-op, not an error.
    pub async fn remove_role(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
        member_id: MembershipId,
        role_id: RoleId,
    ) -> AppResult<Membership> {
        self.access
            .require_admin(association_id, actor.subject())
            .await?;

        let mut target = self.load_target_member(association_id, member_id).await?;
        target.remove_role(role_id);
        self.membership_repository.update(&target).await?;
        self.access
            .invalidate_member(association_id, &target.user_subject)
            .await;

        self.append_audit(
            association_id,
            actor,
            AuditAction::RoleRemoved,
            "association_membership",
            member_id.to_string(),
            format!("removed role '{role_id}' from '{}'", target.user_subject),
        )
        .await?;

        Ok(target)
    }

    /// Grants a permission directly to a member; a standing revoke for the
    /// same id is withdrawn.
    pub async fn grant_permission(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
        member_id: MembershipId,
        permission: PermissionId,
    ) -> AppResult<Membership> {
        self.apply_override(actor, association_id, member_id, permission, true)
            .await
    }

    /// Revokes a permission directly from a member; a standing grant for
    /// the same id is withdrawn.
    pub async fn revoke_permission(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
        member_id: MembershipId,
        permission: PermissionId,
    ) -> AppResult<Membership> {
        self.apply_override(actor, association_id, member_id, permission, false)
            .await
    }

    /// Returns a member's roles and effective permissions, visible to the
    /// association admin and to the member themselves.
    pub async fn member_roles(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
        member_id: MembershipId,
    ) -> AppResult<MemberRolesView> {
        let actor_membership = self
            .access
            .require_membership(association_id, actor.subject())
            .await?;
        if !actor_membership.is_admin && actor_membership.membership_id != member_id {
            return Err(AppError::AdminOnly(
                "only the admin may view other members' roles".to_owned(),
            ));
        }

        let membership = self.load_target_member(association_id, member_id).await?;
        let association = self.access.load_association(association_id).await?;
        let effective_permissions = self
            .access
            .effective_permissions_for(&association, &membership)
            .await?;

        let mut roles = Vec::new();
        for role_id in &membership.assigned_roles {
            if let Some(role) = self
                .role_repository
                .find_role(association_id, *role_id)
                .await?
            {
                roles.push(role);
            }
        }

        Ok(MemberRolesView {
            membership,
            roles,
            effective_permissions,
        })
    }

    async fn apply_override(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
        member_id: MembershipId,
        permission: PermissionId,
        grant: bool,
    ) -> AppResult<Membership> {
        self.access
            .require_admin(association_id, actor.subject())
            .await?;
        self.ensure_permissions_in_catalog(
            association_id,
            &[permission.clone()].into_iter().collect(),
        )
        .await?;

        let mut target = self.load_target_member(association_id, member_id).await?;
        if !target.is_active() {
            return Err(AppError::MembershipRequired(member_id.to_string()));
        }

        let (action, verb) = if grant {
            target.grant(permission.clone());
            (AuditAction::PermissionGranted, "granted")
        } else {
            target.revoke(permission.clone());
            (AuditAction::PermissionRevokedFromMember, "revoked")
        };

        self.membership_repository.update(&target).await?;
        self.access
            .invalidate_member(association_id, &target.user_subject)
            .await;

        self.append_audit(
            association_id,
            actor,
            action,
            "association_membership",
            member_id.to_string(),
            format!("{verb} '{permission}' for '{}'", target.user_subject),
        )
        .await?;

        Ok(target)
    }
}
