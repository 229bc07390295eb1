use std::collections::BTreeSet;

use amicale_core::{AppResult, AssociationId};
use amicale_domain::{Membership, MembershipId, RoleId};
use async_trait::async_trait;

/// Repository port for membership records.
///
/// Multi-row mutations (`replace_roles_with_eviction`, `transfer_admin`)
/// MUST run inside a single transaction: a crash between the sub-updates
/// must leave either the pre- or post-state, never a mix.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Finds the active membership of a subject in an association.
    async fn find_active(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<Option<Membership>>;

    /// Finds a membership of any status by subject.
    async fn find_by_subject(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<Option<Membership>>;

    /// Finds a membership of any status by identifier.
    async fn find_by_id(
        &self,
        association_id: AssociationId,
        membership_id: MembershipId,
    ) -> AppResult<Option<Membership>>;

    /// Inserts a new membership; one membership per (association, subject).
    async fn insert(&self, membership: &Membership) -> AppResult<()>;

    /// Persists role, override and status fields of a membership.
    async fn update(&self, membership: &Membership) -> AppResult<()>;

    /// Replaces a member's assigned role set.
    ///
    /// Each role in `unique_roles` is simultaneously stripped from every
    /// other membership of the association, all in one transaction.
    /// Returns the updated membership.
    async fn replace_roles_with_eviction(
        &self,
        association_id: AssociationId,
        membership_id: MembershipId,
        roles: BTreeSet<RoleId>,
        unique_roles: Vec<RoleId>,
    ) -> AppResult<Membership>;

    /// Atomically moves the admin flag from one membership to another.
    ///
    /// Fails with a conflict when `from` no longer holds the flag, which
    /// makes concurrent transfers lose cleanly instead of minting a
    /// second admin.
    async fn transfer_admin(
        &self,
        association_id: AssociationId,
        from: MembershipId,
        to: MembershipId,
    ) -> AppResult<()>;

    /// Lists the memberships of an association, every status included.
    async fn list_members(&self, association_id: AssociationId) -> AppResult<Vec<Membership>>;
}
