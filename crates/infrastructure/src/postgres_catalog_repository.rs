use amicale_application::PermissionCatalogRepository;
use amicale_core::{AppError, AppResult, AssociationId};
use amicale_domain::{PermissionCategory, PermissionDefinition, PermissionId};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed permission catalog repository.
#[derive(Clone)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: String,
    display_name: String,
    category: String,
    description: String,
}

impl PermissionRow {
    fn into_definition(self) -> AppResult<PermissionDefinition> {
        Ok(PermissionDefinition {
            id: PermissionId::new(self.id)?,
            display_name: self.display_name,
            category: PermissionCategory::from_storage(self.category.as_str())?,
            description: self.description,
        })
    }
}

#[async_trait]
impl PermissionCatalogRepository for PostgresCatalogRepository {
    async fn list_permissions(
        &self,
        association_id: AssociationId,
    ) -> AppResult<Vec<PermissionDefinition>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, display_name, category, description
            FROM association_permissions
            WHERE association_id = $1
            "#,
        )
        .bind(association_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission catalog: {error}"))
        })?;

        let mut entries = rows
            .into_iter()
            .map(PermissionRow::into_definition)
            .collect::<AppResult<Vec<_>>>()?;
        // Category order follows the domain enum, not the stored string.
        entries.sort_by(|a, b| (a.category, &a.id).cmp(&(b.category, &b.id)));
        Ok(entries)
    }

    async fn add_permission(
        &self,
        association_id: AssociationId,
        definition: &PermissionDefinition,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO association_permissions (association_id, id, display_name, category, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (association_id, id) DO NOTHING
            "#,
        )
        .bind(association_id.as_uuid())
        .bind(definition.id.as_str())
        .bind(definition.display_name.as_str())
        .bind(definition.category.as_str())
        .bind(definition.description.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to add permission catalog entry: {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "permission '{}' already exists",
                definition.id
            )));
        }

        Ok(())
    }
}
