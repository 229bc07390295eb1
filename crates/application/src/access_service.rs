use std::collections::BTreeSet;
use std::sync::Arc;

use amicale_core::{AppError, AppResult, AssociationId};
use amicale_domain::{
    Association, LegacyRole, Membership, PermissionId, PermissionModel, Resolution, RoleSet,
    effective_permissions, has_legacy_role, resolve_permission,
};
use tracing::warn;

use crate::access_ports::{
    AssociationRepository, MembershipRepository, PermissionCache, PermissionCatalogRepository,
    RoleRepository,
};

/// Application service for association-scoped access checks.
///
/// Implements both stages of the access-control layer: membership loading
/// for an `(actor, association)` pair and permission resolution against
/// the association's configured strategy. All reads are request-scoped;
/// the permission cache is consulted opportunistically and every cache
/// failure is swallowed.
#[derive(Clone)]
pub struct AccessService {
    association_repository: Arc<dyn AssociationRepository>,
    membership_repository: Arc<dyn MembershipRepository>,
    role_repository: Arc<dyn RoleRepository>,
    catalog_repository: Arc<dyn PermissionCatalogRepository>,
    cache: Arc<dyn PermissionCache>,
}

impl AccessService {
    /// Creates a new access service from repository implementations.
    #[must_use]
    pub fn new(
        association_repository: Arc<dyn AssociationRepository>,
        membership_repository: Arc<dyn MembershipRepository>,
        role_repository: Arc<dyn RoleRepository>,
        catalog_repository: Arc<dyn PermissionCatalogRepository>,
        cache: Arc<dyn PermissionCache>,
    ) -> Self {
        Self {
            association_repository,
            membership_repository,
            role_repository,
            catalog_repository,
            cache,
        }
    }

    /// Loads an association or fails with `NotFound`.
    pub async fn load_association(&self, association_id: AssociationId) -> AppResult<Association> {
        self.association_repository
            .find(association_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("association '{association_id}'")))
    }

    /// Resolves the active membership of a subject, stage (a) of the
    /// access-control layer.
    pub async fn require_membership(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<Membership> {
        self.membership_repository
            .find_active(association_id, subject)
            .await?
            .ok_or_else(|| AppError::NotAssociationMember(association_id.to_string()))
    }

    /// Resolves the active membership and requires the admin flag.
    pub async fn require_admin(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<Membership> {
        let membership = self.require_membership(association_id, subject).await?;
        if !membership.is_admin {
            return Err(AppError::AdminOnly(
                "this operation is reserved to the association admin".to_owned(),
            ));
        }

        Ok(membership)
    }

    /// Requires a permission, stage (b) of the access-control layer.
    ///
    /// Returns the actor's membership on success so handlers can reuse it
    /// without a second load.
    pub async fn require_permission(
        &self,
        association_id: AssociationId,
        subject: &str,
        permission: &PermissionId,
    ) -> AppResult<Membership> {
        let association = self.load_association(association_id).await?;
        let membership = self.require_membership(association_id, subject).await?;

        match association.permission_model {
            PermissionModel::Catalog => {
                let roles = self.load_role_set(association_id).await?;
                match resolve_permission(&membership, &roles, permission) {
                    resolution if resolution.is_allowed() => Ok(membership),
                    Resolution::DeniedRevoked => {
                        Err(AppError::PermissionRevoked(permission.to_string()))
                    }
                    _ => Err(AppError::InsufficientPermissions {
                        permission: permission.to_string(),
                        current_roles: roles.role_names_for(&membership),
                    }),
                }
            }
            PermissionModel::Legacy => {
                let allowed = membership.is_admin
                    || membership
                        .legacy_role
                        .is_some_and(|role| role.implied_permissions().contains(permission.as_str()));
                if allowed {
                    Ok(membership)
                } else {
                    Err(AppError::InsufficientPermissions {
                        permission: permission.to_string(),
                        current_roles: membership
                            .legacy_role
                            .map(|role| vec![role.as_str().to_owned()])
                            .unwrap_or_default(),
                    })
                }
            }
        }
    }

    /// Returns whether the subject currently has the permission.
    pub async fn has_permission(
        &self,
        association_id: AssociationId,
        subject: &str,
        permission: &PermissionId,
    ) -> AppResult<bool> {
        let membership = self.require_membership(association_id, subject).await?;
        if membership.is_admin {
            // Admin override is unconditional; no catalog or cache read.
            return Ok(true);
        }

        if let Some(cached) = self.cached_effective(association_id, subject).await {
            return Ok(cached.contains(permission));
        }

        let association = self.load_association(association_id).await?;
        let effective = self
            .compute_effective(&association, &membership)
            .await?;
        self.store_effective(association_id, subject, &effective).await;

        Ok(effective.contains(permission))
    }

    /// Computes the full effective permission set of a membership.
    pub async fn effective_permissions_for(
        &self,
        association: &Association,
        membership: &Membership,
    ) -> AppResult<BTreeSet<PermissionId>> {
        self.compute_effective(association, membership).await
    }

    /// Requires a legacy hierarchical role, the compatibility strategy for
    /// associations not yet migrated to the catalog model.
    pub async fn require_legacy_role(
        &self,
        association_id: AssociationId,
        subject: &str,
        required: LegacyRole,
    ) -> AppResult<Membership> {
        let membership = self.require_membership(association_id, subject).await?;
        if has_legacy_role(&membership, required) {
            return Ok(membership);
        }

        Err(AppError::InsufficientPermissions {
            permission: required.as_str().to_owned(),
            current_roles: membership
                .legacy_role
                .map(|role| vec![role.as_str().to_owned()])
                .unwrap_or_default(),
        })
    }

    /// Drops the cached resolution inputs for one member, best-effort.
    pub async fn invalidate_member(&self, association_id: AssociationId, subject: &str) {
        if let Err(error) = self.cache.invalidate_member(association_id, subject).await {
            warn!(%association_id, %error, "permission cache member invalidation failed");
        }
    }

    /// Drops every cached entry of an association, best-effort.
    pub async fn invalidate_association(&self, association_id: AssociationId) {
        if let Err(error) = self.cache.invalidate_association(association_id).await {
            warn!(%association_id, %error, "permission cache association invalidation failed");
        }
    }

    async fn load_role_set(&self, association_id: AssociationId) -> AppResult<RoleSet> {
        Ok(RoleSet::from_roles(
            self.role_repository.list_roles(association_id).await?,
        ))
    }

    async fn compute_effective(
        &self,
        association: &Association,
        membership: &Membership,
    ) -> AppResult<BTreeSet<PermissionId>> {
        let catalog = self
            .catalog_repository
            .list_permissions(association.association_id)
            .await?;

        match association.permission_model {
            PermissionModel::Catalog => {
                let roles = self.load_role_set(association.association_id).await?;
                Ok(effective_permissions(membership, &roles, &catalog))
            }
            PermissionModel::Legacy => {
                if membership.is_admin {
                    return Ok(catalog.into_iter().map(|entry| entry.id).collect());
                }

                let implied = membership
                    .legacy_role
                    .map(|role| role.implied_permissions())
                    .unwrap_or_default();

                Ok(catalog
                    .into_iter()
                    .map(|entry| entry.id)
                    .filter(|id| implied.contains(id.as_str()))
                    .collect())
            }
        }
    }

    async fn cached_effective(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> Option<BTreeSet<PermissionId>> {
        match self.cache.get_effective(association_id, subject).await {
            Ok(value) => value,
            Err(error) => {
                warn!(%association_id, %error, "permission cache read failed");
                None
            }
        }
    }

    async fn store_effective(
        &self,
        association_id: AssociationId,
        subject: &str,
        permissions: &BTreeSet<PermissionId>,
    ) {
        if let Err(error) = self
            .cache
            .put_effective(association_id, subject, permissions)
            .await
        {
            warn!(%association_id, %error, "permission cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use amicale_core::AppError;
    use amicale_domain::{LegacyRole, MembershipStatus, PermissionModel};

    use crate::test_support::{Fixture, permission};

    #[tokio::test]
    async fn require_membership_rejects_pending_members() {
        let fixture = Fixture::new(PermissionModel::Catalog).await;
        fixture
            .add_member("bob", MembershipStatus::Pending, false)
            .await;

        let result = fixture
            .access
            .require_membership(fixture.association_id, "bob")
            .await;
        assert!(matches!(result, Err(AppError::NotAssociationMember(_))));
    }

    #[tokio::test]
    async fn require_admin_rejects_plain_members() {
        let fixture = Fixture::new(PermissionModel::Catalog).await;
        fixture
            .add_member("bob", MembershipStatus::Active, false)
            .await;

        let result = fixture
            .access
            .require_admin(fixture.association_id, "bob")
            .await;
        assert!(matches!(result, Err(AppError::AdminOnly(_))));
    }

    #[tokio::test]
    async fn require_permission_reports_revoked_layer() {
        let fixture = Fixture::new(PermissionModel::Catalog).await;
        let role_id = fixture.add_role("treasurer", &["view_finances"], false).await;
        let mut member = fixture
            .add_member("bob", MembershipStatus::Active, false)
            .await;
        member.assigned_roles = [role_id].into_iter().collect();
        member.revoke(permission("view_finances"));
        fixture.save_member(&member).await;

        let result = fixture
            .access
            .require_permission(fixture.association_id, "bob", &permission("view_finances"))
            .await;
        assert!(matches!(result, Err(AppError::PermissionRevoked(_))));
    }

    #[tokio::test]
    async fn insufficient_permission_payload_lists_current_roles() {
        let fixture = Fixture::new(PermissionModel::Catalog).await;
        let role_id = fixture.add_role("treasurer", &["view_finances"], false).await;
        let mut member = fixture
            .add_member("bob", MembershipStatus::Active, false)
            .await;
        member.assigned_roles = [role_id].into_iter().collect();
        fixture.save_member(&member).await;

        let result = fixture
            .access
            .require_permission(fixture.association_id, "bob", &permission("manage_members"))
            .await;
        match result {
            Err(AppError::InsufficientPermissions { current_roles, .. }) => {
                assert_eq!(current_roles, vec!["treasurer".to_owned()]);
            }
            other => panic!("expected InsufficientPermissions, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn legacy_association_resolves_via_hierarchy() {
        let fixture = Fixture::new(PermissionModel::Legacy).await;
        let mut member = fixture
            .add_member("bob", MembershipStatus::Active, false)
            .await;
        member.legacy_role = Some(LegacyRole::Treasurer);
        fixture.save_member(&member).await;

        let allowed = fixture
            .access
            .require_permission(fixture.association_id, "bob", &permission("manage_finances"))
            .await;
        assert!(allowed.is_ok());

        let denied = fixture
            .access
            .require_permission(fixture.association_id, "bob", &permission("manage_roles"))
            .await;
        assert!(matches!(
            denied,
            Err(AppError::InsufficientPermissions { .. })
        ));
    }

    #[tokio::test]
    async fn legacy_role_check_is_admin_overridable() {
        let fixture = Fixture::new(PermissionModel::Legacy).await;
        fixture
            .add_member("root", MembershipStatus::Active, true)
            .await;

        let result = fixture
            .access
            .require_legacy_role(fixture.association_id, "root", LegacyRole::President)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn has_permission_survives_a_failing_cache() {
        let fixture = Fixture::with_failing_cache(PermissionModel::Catalog).await;
        let role_id = fixture.add_role("treasurer", &["view_finances"], false).await;
        let mut member = fixture
            .add_member("bob", MembershipStatus::Active, false)
            .await;
        member.assigned_roles = [role_id].into_iter().collect();
        fixture.save_member(&member).await;

        let result = fixture
            .access
            .has_permission(fixture.association_id, "bob", &permission("view_finances"))
            .await;
        assert_eq!(result.ok(), Some(true));
    }
}
