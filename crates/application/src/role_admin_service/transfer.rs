use super::*;

use amicale_domain::AuditAction;

impl RoleAdminService {
    /// Transfers admin authority to another active member.
    ///
    /// Both flag flips happen in one transaction; a concurrent transfer
    /// for the same association loses with a conflict instead of leaving
    /// zero or two admins.
    pub async fn transfer_admin(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
        new_admin_member_id: MembershipId,
    ) -> AppResult<()> {
        let actor_membership = self
            .access
            .require_membership(association_id, actor.subject())
            .await?;
        if !actor_membership.is_admin {
            return Err(AppError::AdminOnly(
                "only the current admin may transfer admin authority".to_owned(),
            ));
        }

        let target = self
            .load_target_member(association_id, new_admin_member_id)
            .await?;
        if !target.is_active() {
            return Err(AppError::MembershipRequired(new_admin_member_id.to_string()));
        }
        if target.membership_id == actor_membership.membership_id {
            return Err(AppError::Conflict(
                "cannot transfer admin authority to the current admin".to_owned(),
            ));
        }

        self.membership_repository
            .transfer_admin(
                association_id,
                actor_membership.membership_id,
                new_admin_member_id,
            )
            .await?;
        self.access.invalidate_association(association_id).await;

        self.append_audit(
            association_id,
            actor,
            AuditAction::AdminTransferred,
            "association_membership",
            new_admin_member_id.to_string(),
            format!(
                "transferred admin authority from '{}' to '{}'",
                actor_membership.user_subject, target.user_subject
            ),
        )
        .await
    }
}
