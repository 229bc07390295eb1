use amicale_core::{AppResult, AssociationId};
use amicale_domain::PermissionDefinition;
use async_trait::async_trait;

/// Repository port for per-association permission catalogs.
#[async_trait]
pub trait PermissionCatalogRepository: Send + Sync {
    /// Lists the catalog of an association, ordered by category then id.
    ///
    /// Unknown associations yield an empty catalog, not an error.
    async fn list_permissions(
        &self,
        association_id: AssociationId,
    ) -> AppResult<Vec<PermissionDefinition>>;

    /// Adds a catalog entry; fails with a conflict on duplicate id.
    async fn add_permission(
        &self,
        association_id: AssociationId,
        definition: &PermissionDefinition,
    ) -> AppResult<()>;
}
