use std::collections::BTreeSet;

use amicale_application::RoleRepository;
use amicale_core::{AppError, AppResult, AssociationId};
use amicale_domain::{PermissionId, Role, RoleId};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed role definition repository.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    association_id: Uuid,
    name: String,
    description: String,
    permissions: Json<BTreeSet<PermissionId>>,
    color: Option<String>,
    icon: Option<String>,
    is_unique: bool,
}

impl RoleRow {
    fn into_role(self) -> Role {
        Role {
            role_id: RoleId::from_uuid(self.id),
            association_id: AssociationId::from_uuid(self.association_id),
            name: self.name,
            description: self.description,
            permissions: self.permissions.0,
            color: self.color,
            icon: self.icon,
            is_unique: self.is_unique,
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|database_error| database_error.code())
        .is_some_and(|code| code == "23505")
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn list_roles(&self, association_id: AssociationId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, association_id, name, description, permissions, color, icon, is_unique
            FROM association_roles
            WHERE association_id = $1
            ORDER BY name
            "#,
        )
        .bind(association_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        Ok(rows.into_iter().map(RoleRow::into_role).collect())
    }

    async fn find_role(
        &self,
        association_id: AssociationId,
        role_id: RoleId,
    ) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, association_id, name, description, permissions, color, icon, is_unique
            FROM association_roles
            WHERE association_id = $1 AND id = $2
            "#,
        )
        .bind(association_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        Ok(row.map(RoleRow::into_role))
    }

    async fn insert_role(&self, role: &Role) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO association_roles (id, association_id, name, description, permissions, color, icon, is_unique)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(role.role_id.as_uuid())
        .bind(role.association_id.as_uuid())
        .bind(role.name.as_str())
        .bind(role.description.as_str())
        .bind(Json(&role.permissions))
        .bind(role.color.as_deref())
        .bind(role.icon.as_deref())
        .bind(role.is_unique)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::DuplicateRoleName(role.name.clone())
            } else {
                AppError::Internal(format!("failed to insert role: {error}"))
            }
        })?;

        Ok(())
    }

    async fn update_role(&self, role: &Role) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE association_roles
            SET name = $3,
                description = $4,
                permissions = $5,
                color = $6,
                icon = $7,
                is_unique = $8,
                updated_at = now()
            WHERE association_id = $1 AND id = $2
            "#,
        )
        .bind(role.association_id.as_uuid())
        .bind(role.role_id.as_uuid())
        .bind(role.name.as_str())
        .bind(role.description.as_str())
        .bind(Json(&role.permissions))
        .bind(role.color.as_deref())
        .bind(role.icon.as_deref())
        .bind(role.is_unique)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                AppError::DuplicateRoleName(role.name.clone())
            } else {
                AppError::Internal(format!("failed to update role: {error}"))
            }
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::RoleNotFound(role.role_id.to_string()));
        }

        Ok(())
    }

    async fn delete_role(
        &self,
        association_id: AssociationId,
        role_id: RoleId,
        force: bool,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let holders = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM association_memberships
            WHERE association_id = $1
              AND status <> 'excluded'
              AND assigned_roles @> $2
            "#,
        )
        .bind(association_id.as_uuid())
        .bind(Json([role_id]))
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count role holders: {error}")))?;

        if holders > 0 && !force {
            return Err(AppError::RoleInUse(role_id.to_string()));
        }

        if force {
            sqlx::query(
                r#"
                UPDATE association_memberships
                SET assigned_roles = assigned_roles - $2
                WHERE association_id = $1 AND assigned_roles @> $3
                "#,
            )
            .bind(association_id.as_uuid())
            .bind(role_id.to_string())
            .bind(Json([role_id]))
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to strip role assignments: {error}"))
            })?;
        }

        let result = sqlx::query(
            r#"
            DELETE FROM association_roles
            WHERE association_id = $1 AND id = $2
            "#,
        )
        .bind(association_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::RoleNotFound(role_id.to_string()));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }
}
