use std::collections::BTreeSet;

use amicale_core::{AppResult, AssociationId};
use amicale_domain::PermissionId;
use async_trait::async_trait;

/// Cache port for resolved effective permission sets.
///
/// Every implementation is best-effort: callers swallow errors from these
/// methods, so a missing or failing cache only costs latency, never
/// correctness.
#[async_trait]
pub trait PermissionCache: Send + Sync {
    /// Reads a cached effective permission set for a member.
    async fn get_effective(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<Option<BTreeSet<PermissionId>>>;

    /// Stores an effective permission set for a member.
    async fn put_effective(
        &self,
        association_id: AssociationId,
        subject: &str,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<()>;

    /// Drops the cached entry for one member.
    async fn invalidate_member(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<()>;

    /// Drops every cached entry of an association, used after role
    /// definition changes that affect an unknown set of members.
    async fn invalidate_association(&self, association_id: AssociationId) -> AppResult<()>;
}
