//! In-memory fakes and a service fixture shared by the service tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use amicale_core::{AppError, AppResult, AssociationId, UserIdentity};
use amicale_domain::{
    Association, Membership, MembershipId, MembershipStatus, PermissionDefinition, PermissionId,
    PermissionModel, Role, RoleId, default_catalog,
};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::access_ports::{
    AssociationRepository, AuditEvent, AuditRepository, MembershipRepository, PermissionCache,
    PermissionCatalogRepository, RoleRepository,
};
use crate::access_service::AccessService;
use crate::membership_service::MembershipService;
use crate::role_admin_service::RoleAdminService;

/// Builds an actor identity for a subject.
pub fn actor(subject: &str) -> UserIdentity {
    UserIdentity::new(subject, subject, None)
}

/// Builds a permission id from a known-valid literal.
pub fn permission(value: &str) -> PermissionId {
    PermissionId::new(value).unwrap_or_else(|_| unreachable!("valid test permission id"))
}

/// In-memory implementation of every repository port, with the same
/// transactional semantics the Postgres adapters provide.
#[derive(Default)]
pub struct InMemoryStore {
    associations: Mutex<HashMap<AssociationId, Association>>,
    catalogs: Mutex<HashMap<AssociationId, Vec<PermissionDefinition>>>,
    roles: Mutex<Vec<Role>>,
    memberships: Mutex<Vec<Membership>>,
}

#[async_trait]
impl AssociationRepository for InMemoryStore {
    async fn find(&self, association_id: AssociationId) -> AppResult<Option<Association>> {
        Ok(self.associations.lock().await.get(&association_id).cloned())
    }

    async fn create(
        &self,
        association: &Association,
        catalog: &[PermissionDefinition],
    ) -> AppResult<()> {
        self.associations
            .lock()
            .await
            .insert(association.association_id, association.clone());
        self.catalogs
            .lock()
            .await
            .insert(association.association_id, catalog.to_vec());
        Ok(())
    }
}

#[async_trait]
impl PermissionCatalogRepository for InMemoryStore {
    async fn list_permissions(
        &self,
        association_id: AssociationId,
    ) -> AppResult<Vec<PermissionDefinition>> {
        let mut entries = self
            .catalogs
            .lock()
            .await
            .get(&association_id)
            .cloned()
            .unwrap_or_default();
        entries.sort_by(|a, b| (a.category, &a.id).cmp(&(b.category, &b.id)));
        Ok(entries)
    }

    async fn add_permission(
        &self,
        association_id: AssociationId,
        definition: &PermissionDefinition,
    ) -> AppResult<()> {
        let mut catalogs = self.catalogs.lock().await;
        let entries = catalogs.entry(association_id).or_default();
        if entries.iter().any(|entry| entry.id == definition.id) {
            return Err(AppError::Conflict(format!(
                "permission '{}' already exists",
                definition.id
            )));
        }
        entries.push(definition.clone());
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn list_roles(&self, association_id: AssociationId) -> AppResult<Vec<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .filter(|role| role.association_id == association_id)
            .cloned()
            .collect())
    }

    async fn find_role(
        &self,
        association_id: AssociationId,
        role_id: RoleId,
    ) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.association_id == association_id && role.role_id == role_id)
            .cloned())
    }

    async fn insert_role(&self, role: &Role) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        let collision = roles
            .iter()
            .any(|existing| existing.association_id == role.association_id && existing.name == role.name);
        if collision {
            return Err(AppError::DuplicateRoleName(role.name.clone()));
        }
        roles.push(role.clone());
        Ok(())
    }

    async fn update_role(&self, role: &Role) -> AppResult<()> {
        let mut roles = self.roles.lock().await;
        match roles
            .iter_mut()
            .find(|existing| existing.role_id == role.role_id)
        {
            Some(existing) => {
                *existing = role.clone();
                Ok(())
            }
            None => Err(AppError::RoleNotFound(role.role_id.to_string())),
        }
    }

    async fn delete_role(
        &self,
        association_id: AssociationId,
        role_id: RoleId,
        force: bool,
    ) -> AppResult<()> {
        let mut memberships = self.memberships.lock().await;
        let in_use = memberships.iter().any(|membership| {
            membership.association_id == association_id
                && membership.status != MembershipStatus::Excluded
                && membership.assigned_roles.contains(&role_id)
        });

        if in_use && !force {
            return Err(AppError::RoleInUse(role_id.to_string()));
        }
        if force {
            for membership in memberships.iter_mut() {
                if membership.association_id == association_id {
                    membership.assigned_roles.remove(&role_id);
                }
            }
        }
        self.roles
            .lock()
            .await
            .retain(|role| !(role.association_id == association_id && role.role_id == role_id));
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for InMemoryStore {
    async fn find_active(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<Option<Membership>> {
        Ok(self.memberships.lock().await.iter().find(|membership| {
            membership.association_id == association_id
                && membership.user_subject == subject
                && membership.status == MembershipStatus::Active
        }).cloned())
    }

    async fn find_by_subject(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<Option<Membership>> {
        Ok(self.memberships.lock().await.iter().find(|membership| {
            membership.association_id == association_id && membership.user_subject == subject
        }).cloned())
    }

    async fn find_by_id(
        &self,
        association_id: AssociationId,
        membership_id: MembershipId,
    ) -> AppResult<Option<Membership>> {
        Ok(self.memberships.lock().await.iter().find(|membership| {
            membership.association_id == association_id
                && membership.membership_id == membership_id
        }).cloned())
    }

    async fn insert(&self, membership: &Membership) -> AppResult<()> {
        let mut memberships = self.memberships.lock().await;
        let collision = memberships.iter().any(|existing| {
            existing.association_id == membership.association_id
                && existing.user_subject == membership.user_subject
        });
        if collision {
            return Err(AppError::Conflict(format!(
                "membership for '{}' already exists",
                membership.user_subject
            )));
        }
        memberships.push(membership.clone());
        Ok(())
    }

    async fn update(&self, membership: &Membership) -> AppResult<()> {
        let mut memberships = self.memberships.lock().await;
        match memberships
            .iter_mut()
            .find(|existing| existing.membership_id == membership.membership_id)
        {
            Some(existing) => {
                *existing = membership.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "membership '{}'",
                membership.membership_id
            ))),
        }
    }

    async fn replace_roles_with_eviction(
        &self,
        association_id: AssociationId,
        membership_id: MembershipId,
        roles: BTreeSet<RoleId>,
        unique_roles: Vec<RoleId>,
    ) -> AppResult<Membership> {
        let mut memberships = self.memberships.lock().await;
        for membership in memberships.iter_mut() {
            if membership.association_id == association_id
                && membership.membership_id != membership_id
            {
                for role_id in &unique_roles {
                    membership.assigned_roles.remove(role_id);
                }
            }
        }

        let target = memberships
            .iter_mut()
            .find(|membership| {
                membership.association_id == association_id
                    && membership.membership_id == membership_id
            })
            .ok_or_else(|| AppError::NotFound(format!("membership '{membership_id}'")))?;
        target.assigned_roles = roles;
        Ok(target.clone())
    }

    async fn transfer_admin(
        &self,
        association_id: AssociationId,
        from: MembershipId,
        to: MembershipId,
    ) -> AppResult<()> {
        let mut memberships = self.memberships.lock().await;
        let from_is_admin = memberships.iter().any(|membership| {
            membership.association_id == association_id
                && membership.membership_id == from
                && membership.is_admin
        });
        if !from_is_admin {
            return Err(AppError::Conflict(
                "admin authority was transferred concurrently".to_owned(),
            ));
        }

        for membership in memberships.iter_mut() {
            if membership.association_id != association_id {
                continue;
            }
            if membership.membership_id == from {
                membership.is_admin = false;
            }
            if membership.membership_id == to {
                membership.is_admin = true;
            }
        }
        Ok(())
    }

    async fn list_members(&self, association_id: AssociationId) -> AppResult<Vec<Membership>> {
        Ok(self
            .memberships
            .lock()
            .await
            .iter()
            .filter(|membership| membership.association_id == association_id)
            .cloned()
            .collect())
    }
}

/// Audit repository fake capturing appended events.
#[derive(Default)]
pub struct FakeAuditRepository {
    /// Captured events, in append order.
    pub events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// Cache fake that stores nothing.
pub struct NullCache;

#[async_trait]
impl PermissionCache for NullCache {
    async fn get_effective(
        &self,
        _association_id: AssociationId,
        _subject: &str,
    ) -> AppResult<Option<BTreeSet<PermissionId>>> {
        Ok(None)
    }

    async fn put_effective(
        &self,
        _association_id: AssociationId,
        _subject: &str,
        _permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn invalidate_member(
        &self,
        _association_id: AssociationId,
        _subject: &str,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn invalidate_association(&self, _association_id: AssociationId) -> AppResult<()> {
        Ok(())
    }
}

/// Cache fake whose every call fails, for degraded-cache tests.
pub struct FailingCache;

#[async_trait]
impl PermissionCache for FailingCache {
    async fn get_effective(
        &self,
        _association_id: AssociationId,
        _subject: &str,
    ) -> AppResult<Option<BTreeSet<PermissionId>>> {
        Err(AppError::Internal("cache unavailable".to_owned()))
    }

    async fn put_effective(
        &self,
        _association_id: AssociationId,
        _subject: &str,
        _permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<()> {
        Err(AppError::Internal("cache unavailable".to_owned()))
    }

    async fn invalidate_member(
        &self,
        _association_id: AssociationId,
        _subject: &str,
    ) -> AppResult<()> {
        Err(AppError::Internal("cache unavailable".to_owned()))
    }

    async fn invalidate_association(&self, _association_id: AssociationId) -> AppResult<()> {
        Err(AppError::Internal("cache unavailable".to_owned()))
    }
}

/// Wired services over one in-memory store, with 'alice' installed as the
/// active admin of a fresh association.
pub struct Fixture {
    /// The seeded association.
    pub association_id: AssociationId,
    /// Shared backing store.
    pub store: Arc<InMemoryStore>,
    /// Captured audit events.
    pub audit: Arc<FakeAuditRepository>,
    /// Access service under test.
    pub access: AccessService,
    /// Role admin service under test.
    pub role_admin: RoleAdminService,
    /// Membership service under test.
    pub membership: MembershipService,
}

impl Fixture {
    /// Builds a fixture with a no-op cache.
    pub async fn new(permission_model: PermissionModel) -> Self {
        Self::build(permission_model, Arc::new(NullCache)).await
    }

    /// Builds a fixture whose cache fails every call.
    pub async fn with_failing_cache(permission_model: PermissionModel) -> Self {
        Self::build(permission_model, Arc::new(FailingCache)).await
    }

    async fn build(permission_model: PermissionModel, cache: Arc<dyn PermissionCache>) -> Self {
        let store = Arc::new(InMemoryStore::default());
        let audit = Arc::new(FakeAuditRepository::default());

        let association = Association {
            association_id: AssociationId::new(),
            name: "Amicale des Ressortissants".to_owned(),
            permission_model,
        };
        AssociationRepository::create(store.as_ref(), &association, &default_catalog())
            .await
            .unwrap_or_else(|error| panic!("fixture association create failed: {error}"));

        let mut admin = Membership::join_request(
            association.association_id,
            "alice",
            "Alice",
        );
        admin.status = MembershipStatus::Active;
        admin.is_admin = true;
        MembershipRepository::insert(store.as_ref(), &admin)
            .await
            .unwrap_or_else(|error| panic!("fixture admin insert failed: {error}"));

        let access = AccessService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            cache,
        );
        let role_admin = RoleAdminService::new(
            access.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            audit.clone(),
        );
        let membership = MembershipService::new(
            access.clone(),
            store.clone(),
            store.clone(),
            audit.clone(),
        );

        Self {
            association_id: association.association_id,
            store,
            audit,
            access,
            role_admin,
            membership,
        }
    }

    /// Inserts a membership with the given status and admin flag.
    pub async fn add_member(
        &self,
        subject: &str,
        status: MembershipStatus,
        is_admin: bool,
    ) -> Membership {
        let mut membership = Membership::join_request(self.association_id, subject, subject);
        membership.status = status;
        membership.is_admin = is_admin;
        MembershipRepository::insert(self.store.as_ref(), &membership)
            .await
            .unwrap_or_else(|error| panic!("fixture member insert failed: {error}"));
        membership
    }

    /// Persists changes made to a membership copy.
    pub async fn save_member(&self, membership: &Membership) {
        MembershipRepository::update(self.store.as_ref(), membership)
            .await
            .unwrap_or_else(|error| panic!("fixture member update failed: {error}"));
    }

    /// Inserts a role directly into the store and returns its id.
    pub async fn add_role(&self, name: &str, permissions: &[&str], is_unique: bool) -> RoleId {
        let role = Role {
            role_id: RoleId::new(),
            association_id: self.association_id,
            name: name.to_owned(),
            description: String::new(),
            permissions: permissions.iter().map(|value| permission(value)).collect(),
            color: None,
            icon: None,
            is_unique,
        };
        RoleRepository::insert_role(self.store.as_ref(), &role)
            .await
            .unwrap_or_else(|error| panic!("fixture role insert failed: {error}"));
        role.role_id
    }

    /// Returns the current state of a membership by subject.
    pub async fn get_member(&self, subject: &str) -> Membership {
        MembershipRepository::find_by_subject(self.store.as_ref(), self.association_id, subject)
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| panic!("fixture member '{subject}' not found"))
    }

    /// Returns the seeded admin membership.
    pub async fn admin_membership(&self) -> Membership {
        self.get_member("alice").await
    }
}
