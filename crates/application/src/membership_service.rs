use std::sync::Arc;

use amicale_core::{AppError, AppResult, AssociationId, UserIdentity};
use amicale_domain::{
    Association, AuditAction, Membership, MembershipId, PermissionModel, default_catalog,
};

use crate::access_ports::{AssociationRepository, AuditEvent, AuditRepository, MembershipRepository};
use crate::access_service::AccessService;

/// Application service for the membership lifecycle: association
/// creation, join requests, admin review and exclusion.
#[derive(Clone)]
pub struct MembershipService {
    access: AccessService,
    association_repository: Arc<dyn AssociationRepository>,
    membership_repository: Arc<dyn MembershipRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl MembershipService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        access: AccessService,
        association_repository: Arc<dyn AssociationRepository>,
        membership_repository: Arc<dyn MembershipRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            access,
            association_repository,
            membership_repository,
            audit_repository,
        }
    }

    /// Creates an association with its seeded catalog and installs the
    /// founder as the admin membership.
    pub async fn create_association(
        &self,
        founder: &UserIdentity,
        name: String,
        permission_model: PermissionModel,
    ) -> AppResult<Association> {
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "association name must not be empty".to_owned(),
            ));
        }

        let association = Association {
            association_id: AssociationId::new(),
            name,
            permission_model,
        };
        self.association_repository
            .create(&association, &default_catalog())
            .await?;

        let mut membership = Membership::join_request(
            association.association_id,
            founder.subject(),
            founder.display_name(),
        );
        membership.status = amicale_domain::MembershipStatus::Active;
        membership.is_admin = true;
        self.membership_repository.insert(&membership).await?;

        Ok(association)
    }

    /// Creates a pending membership for the calling user.
    pub async fn request_join(
        &self,
        identity: &UserIdentity,
        association_id: AssociationId,
    ) -> AppResult<Membership> {
        self.access.load_association(association_id).await?;

        if self
            .membership_repository
            .find_by_subject(association_id, identity.subject())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "a membership already exists in association '{association_id}'"
            )));
        }

        let membership = Membership::join_request(
            association_id,
            identity.subject(),
            identity.display_name(),
        );
        self.membership_repository.insert(&membership).await?;

        self.audit_repository
            .append_event(AuditEvent {
                association_id,
                subject: identity.subject().to_owned(),
                action: AuditAction::MemberJoinRequested,
                resource_type: "association_membership".to_owned(),
                resource_id: membership.membership_id.to_string(),
                detail: None,
            })
            .await?;

        Ok(membership)
    }

    /// Reviews a pending join request: approval activates the membership,
    /// rejection excludes it.
    pub async fn review_join(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
        member_id: MembershipId,
        approve: bool,
    ) -> AppResult<Membership> {
        self.access
            .require_admin(association_id, actor.subject())
            .await?;

        let mut target = self
            .membership_repository
            .find_by_id(association_id, member_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("membership '{member_id}'")))?;

        let action = if approve {
            target.approve()?;
            AuditAction::MemberApproved
        } else {
            if target.status != amicale_domain::MembershipStatus::Pending {
                return Err(AppError::Conflict(format!(
                    "membership '{member_id}' is not pending review"
                )));
            }
            target.exclude();
            AuditAction::MemberExcluded
        };

        self.membership_repository.update(&target).await?;

        self.audit_repository
            .append_event(AuditEvent {
                association_id,
                subject: actor.subject().to_owned(),
                action,
                resource_type: "association_membership".to_owned(),
                resource_id: member_id.to_string(),
                detail: Some(format!("reviewed join request of '{}'", target.user_subject)),
            })
            .await?;

        Ok(target)
    }

    /// Excludes an active member (soft delete); the row is kept and every
    /// later access check fails on status.
    pub async fn exclude_member(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
        member_id: MembershipId,
    ) -> AppResult<Membership> {
        let actor_membership = self
            .access
            .require_admin(association_id, actor.subject())
            .await?;
        if actor_membership.membership_id == member_id {
            return Err(AppError::Conflict(
                "the admin cannot exclude their own membership".to_owned(),
            ));
        }

        let mut target = self
            .membership_repository
            .find_by_id(association_id, member_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("membership '{member_id}'")))?;
        target.exclude();
        self.membership_repository.update(&target).await?;
        self.access
            .invalidate_member(association_id, &target.user_subject)
            .await;

        self.audit_repository
            .append_event(AuditEvent {
                association_id,
                subject: actor.subject().to_owned(),
                action: AuditAction::MemberExcluded,
                resource_type: "association_membership".to_owned(),
                resource_id: member_id.to_string(),
                detail: Some(format!("excluded member '{}'", target.user_subject)),
            })
            .await?;

        Ok(target)
    }

    /// Lists every membership of the association for administrative users.
    pub async fn list_members(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
    ) -> AppResult<Vec<Membership>> {
        self.access
            .require_admin(association_id, actor.subject())
            .await?;
        self.membership_repository.list_members(association_id).await
    }
}

#[cfg(test)]
mod tests {
    use amicale_core::AppError;
    use amicale_domain::{MembershipStatus, PermissionModel};

    use crate::test_support::{Fixture, actor};

    #[tokio::test]
    async fn join_request_starts_pending_and_is_unique() {
        let fixture = Fixture::new(PermissionModel::Catalog).await;

        let membership = fixture
            .membership
            .request_join(&actor("bob"), fixture.association_id)
            .await;
        assert!(membership.is_ok_and(|m| m.status == MembershipStatus::Pending));

        let duplicate = fixture
            .membership
            .request_join(&actor("bob"), fixture.association_id)
            .await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn review_approves_or_excludes_pending_members() {
        let fixture = Fixture::new(PermissionModel::Catalog).await;
        let pending = fixture
            .add_member("bob", MembershipStatus::Pending, false)
            .await;

        let approved = fixture
            .membership
            .review_join(
                &actor("alice"),
                fixture.association_id,
                pending.membership_id,
                true,
            )
            .await;
        assert!(approved.is_ok_and(|m| m.status == MembershipStatus::Active));

        // A second review of the same request conflicts.
        let again = fixture
            .membership
            .review_join(
                &actor("alice"),
                fixture.association_id,
                pending.membership_id,
                false,
            )
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn review_requires_admin() {
        let fixture = Fixture::new(PermissionModel::Catalog).await;
        fixture
            .add_member("bob", MembershipStatus::Active, false)
            .await;
        let pending = fixture
            .add_member("carol", MembershipStatus::Pending, false)
            .await;

        let result = fixture
            .membership
            .review_join(
                &actor("bob"),
                fixture.association_id,
                pending.membership_id,
                true,
            )
            .await;
        assert!(matches!(result, Err(AppError::AdminOnly(_))));
    }

    #[tokio::test]
    async fn excluded_member_loses_access_but_keeps_their_row() {
        let fixture = Fixture::new(PermissionModel::Catalog).await;
        let member = fixture
            .add_member("bob", MembershipStatus::Active, false)
            .await;

        let excluded = fixture
            .membership
            .exclude_member(&actor("alice"), fixture.association_id, member.membership_id)
            .await;
        assert!(excluded.is_ok_and(|m| m.status == MembershipStatus::Excluded));

        let access = fixture
            .access
            .require_membership(fixture.association_id, "bob")
            .await;
        assert!(matches!(access, Err(AppError::NotAssociationMember(_))));

        let members = fixture
            .membership
            .list_members(&actor("alice"), fixture.association_id)
            .await
            .unwrap_or_default();
        assert!(members.iter().any(|m| m.user_subject == "bob"));
    }

    #[tokio::test]
    async fn admin_cannot_exclude_themselves() {
        let fixture = Fixture::new(PermissionModel::Catalog).await;
        let admin = fixture.admin_membership().await;

        let result = fixture
            .membership
            .exclude_member(&actor("alice"), fixture.association_id, admin.membership_id)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
