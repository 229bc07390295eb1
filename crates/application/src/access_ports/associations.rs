use amicale_core::{AppResult, AssociationId};
use amicale_domain::{Association, PermissionDefinition};
use async_trait::async_trait;

/// Repository port for association lookups and creation.
#[async_trait]
pub trait AssociationRepository: Send + Sync {
    /// Finds an association by identifier.
    async fn find(&self, association_id: AssociationId) -> AppResult<Option<Association>>;

    /// Creates an association and seeds its permission catalog in one
    /// transaction.
    async fn create(
        &self,
        association: &Association,
        catalog: &[PermissionDefinition],
    ) -> AppResult<()>;
}
