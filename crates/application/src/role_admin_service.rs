use std::collections::BTreeSet;
use std::sync::Arc;

use amicale_core::{AppError, AppResult, AssociationId, UserIdentity};
use amicale_domain::{Membership, MembershipId, PermissionDefinition, PermissionId, Role, RoleId};

use crate::access_ports::{
    AuditEvent, AuditRepository, MembershipRepository, PermissionCatalogRepository, RoleRepository,
};
use crate::access_service::AccessService;

mod members;
mod roles;
mod transfer;

pub use members::MemberRolesView;


/// Application service for role, override and admin management.
///
/// Every operation here is gated on the actor's association admin flag
/// (or, for read paths, admin-or-self) and emits an audit event on
/// success.
#[derive(Clone)]
pub struct RoleAdminService {
    access: AccessService,
    role_repository: Arc<dyn RoleRepository>,
    membership_repository: Arc<dyn MembershipRepository>,
    catalog_repository: Arc<dyn PermissionCatalogRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleAdminService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        access: AccessService,
        role_repository: Arc<dyn RoleRepository>,
        membership_repository: Arc<dyn MembershipRepository>,
        catalog_repository: Arc<dyn PermissionCatalogRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            access,
            role_repository,
            membership_repository,
            catalog_repository,
            audit_repository,
        }
    }

    /// Returns the association catalog for any active member, ordered by
    /// category then id.
    pub async fn list_catalog(
        &self,
        actor: &UserIdentity,
        association_id: AssociationId,
    ) -> AppResult<Vec<PermissionDefinition>> {
        self.access
            .require_membership(association_id, actor.subject())
            .await?;

        self.catalog_repository
            .list_permissions(association_id)
            .await
    }

    /// Validates that every permission id is part of the association
    /// catalog; fails with `InvalidPermission` on the first offender
    /// instead of silently dropping it.
    async fn ensure_permissions_in_catalog(
        &self,
        association_id: AssociationId,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<()> {
        let catalog = self
            .catalog_repository
            .list_permissions(association_id)
            .await?;
        let known: BTreeSet<&PermissionId> = catalog.iter().map(|entry| &entry.id).collect();

        for permission in permissions {
            if !known.contains(permission) {
                return Err(AppError::InvalidPermission(permission.to_string()));
            }
        }

        Ok(())
    }

    async fn load_role(
        &self,
        association_id: AssociationId,
        role_id: RoleId,
    ) -> AppResult<Role> {
        self.role_repository
            .find_role(association_id, role_id)
            .await?
            .ok_or_else(|| AppError::RoleNotFound(role_id.to_string()))
    }

    async fn load_target_member(
        &self,
        association_id: AssociationId,
        membership_id: MembershipId,
    ) -> AppResult<Membership> {
        self.membership_repository
            .find_by_id(association_id, membership_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("membership '{membership_id}'")))
    }

    async fn append_audit(
        &self,
        association_id: AssociationId,
        actor: &UserIdentity,
        action: amicale_domain::AuditAction,
        resource_type: &str,
        resource_id: String,
        detail: String,
    ) -> AppResult<()> {
        self.audit_repository
            .append_event(AuditEvent {
                association_id,
                subject: actor.subject().to_owned(),
                action,
                resource_type: resource_type.to_owned(),
                resource_id,
                detail: Some(detail),
            })
            .await
    }
}
