use amicale_application::AssociationRepository;
use amicale_core::{AppError, AppResult, AssociationId};
use amicale_domain::{Association, PermissionDefinition, PermissionModel};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed association repository.
#[derive(Clone)]
pub struct PostgresAssociationRepository {
    pool: PgPool,
}

impl PostgresAssociationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssociationRow {
    id: Uuid,
    name: String,
    permission_model: String,
}

#[async_trait]
impl AssociationRepository for PostgresAssociationRepository {
    async fn find(&self, association_id: AssociationId) -> AppResult<Option<Association>> {
        let row = sqlx::query_as::<_, AssociationRow>(
            r#"
            SELECT id, name, permission_model
            FROM associations
            WHERE id = $1
            "#,
        )
        .bind(association_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load association: {error}")))?;

        row.map(|row| {
            Ok(Association {
                association_id: AssociationId::from_uuid(row.id),
                name: row.name,
                permission_model: PermissionModel::from_storage(row.permission_model.as_str())?,
            })
        })
        .transpose()
    }

    async fn create(
        &self,
        association: &Association,
        catalog: &[PermissionDefinition],
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO associations (id, name, permission_model)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(association.association_id.as_uuid())
        .bind(association.name.as_str())
        .bind(association.permission_model.as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create association: {error}")))?;

        for definition in catalog {
            sqlx::query(
                r#"
                INSERT INTO association_permissions (association_id, id, display_name, category, description)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(association.association_id.as_uuid())
            .bind(definition.id.as_str())
            .bind(definition.display_name.as_str())
            .bind(definition.category.as_str())
            .bind(definition.description.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to seed permission catalog: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }
}
