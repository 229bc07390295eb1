use std::collections::BTreeSet;

use amicale_application::PermissionCache;
use amicale_core::{AppResult, AssociationId};
use amicale_domain::PermissionId;
use async_trait::async_trait;

/// Cache adapter that stores nothing, used when no Redis URL is
/// configured. Every permission check then resolves from Postgres.
#[derive(Clone, Default)]
pub struct NoopPermissionCache;

impl NoopPermissionCache {
    /// Creates a new no-op cache.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PermissionCache for NoopPermissionCache {
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
