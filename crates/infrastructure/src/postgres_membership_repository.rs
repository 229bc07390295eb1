use std::collections::BTreeSet;

use amicale_application::MembershipRepository;
use amicale_core::{AppError, AppResult, AssociationId};
use amicale_domain::{
    LegacyRole, Membership, MembershipId, MembershipStatus, PermissionId, PermissionOverrides,
    RoleId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// PostgreSQL-backed membership repository.
///
/// Role assignments and overrides live as JSONB columns on the membership
/// row, so the multi-member mutations below stay single-table updates
/// inside one transaction.
#[derive(Clone)]
pub struct PostgresMembershipRepository {
    pool: PgPool,
}

impl PostgresMembershipRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    id: Uuid,
    association_id: Uuid,
    user_subject: String,
    display_name: String,
    is_admin: bool,
    assigned_roles: Json<BTreeSet<RoleId>>,
    granted: Json<BTreeSet<PermissionId>>,
    revoked: Json<BTreeSet<PermissionId>>,
    legacy_role: Option<String>,
    status: String,
    joined_at: DateTime<Utc>,
}

impl MembershipRow {
    fn into_membership(self) -> AppResult<Membership> {
        let legacy_role = self
            .legacy_role
            .as_deref()
            .map(LegacyRole::from_storage)
            .transpose()?;

        Ok(Membership {
            membership_id: MembershipId::from_uuid(self.id),
            association_id: AssociationId::from_uuid(self.association_id),
            user_subject: self.user_subject,
            display_name: self.display_name,
            is_admin: self.is_admin,
            assigned_roles: self.assigned_roles.0,
            overrides: PermissionOverrides {
                granted: self.granted.0,
                revoked: self.revoked.0,
            },
            legacy_role,
            status: MembershipStatus::from_storage(self.status.as_str())?,
            joined_at: self.joined_at,
        })
    }
}

const SELECT_MEMBERSHIP: &str = r#"
    SELECT id, association_id, user_subject, display_name, is_admin,
           assigned_roles, granted, revoked, legacy_role, status, joined_at
    FROM association_memberships
"#;

async fn fetch_by_id(
    transaction: &mut Transaction<'_, Postgres>,
    association_id: AssociationId,
    membership_id: MembershipId,
) -> AppResult<Option<MembershipRow>> {
    sqlx::query_as::<_, MembershipRow>(&format!(
        "{SELECT_MEMBERSHIP} WHERE association_id = $1 AND id = $2"
    ))
    .bind(association_id.as_uuid())
    .bind(membership_id.as_uuid())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to load membership: {error}")))
}

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    async fn find_active(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(&format!(
            "{SELECT_MEMBERSHIP} WHERE association_id = $1 AND user_subject = $2 AND status = 'active'"
        ))
        .bind(association_id.as_uuid())
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load membership: {error}")))?;

        row.map(MembershipRow::into_membership).transpose()
    }

    async fn find_by_subject(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(&format!(
            "{SELECT_MEMBERSHIP} WHERE association_id = $1 AND user_subject = $2"
        ))
        .bind(association_id.as_uuid())
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load membership: {error}")))?;

        row.map(MembershipRow::into_membership).transpose()
    }

    async fn find_by_id(
        &self,
        association_id: AssociationId,
        membership_id: MembershipId,
    ) -> AppResult<Option<Membership>> {
        let row = sqlx::query_as::<_, MembershipRow>(&format!(
            "{SELECT_MEMBERSHIP} WHERE association_id = $1 AND id = $2"
        ))
        .bind(association_id.as_uuid())
        .bind(membership_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load membership: {error}")))?;

        row.map(MembershipRow::into_membership).transpose()
    }

    async fn insert(&self, membership: &Membership) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO association_memberships
                (id, association_id, user_subject, display_name, is_admin,
                 assigned_roles, granted, revoked, legacy_role, status, joined_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(membership.membership_id.as_uuid())
        .bind(membership.association_id.as_uuid())
        .bind(membership.user_subject.as_str())
        .bind(membership.display_name.as_str())
        .bind(membership.is_admin)
        .bind(Json(&membership.assigned_roles))
        .bind(Json(&membership.overrides.granted))
        .bind(Json(&membership.overrides.revoked))
        .bind(membership.legacy_role.map(|role| role.as_str()))
        .bind(membership.status.as_str())
        .bind(membership.joined_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            let is_duplicate = error
                .as_database_error()
                .and_then(|database_error| database_error.code())
                .is_some_and(|code| code == "23505");
            if is_duplicate {
                AppError::Conflict(format!(
                    "membership for '{}' already exists",
                    membership.user_subject
                ))
            } else {
                AppError::Internal(format!("failed to insert membership: {error}"))
            }
        })?;

        Ok(())
    }

    async fn update(&self, membership: &Membership) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE association_memberships
            SET display_name = $3,
                is_admin = $4,
                assigned_roles = $5,
                granted = $6,
                revoked = $7,
                legacy_role = $8,
                status = $9,
                updated_at = now()
            WHERE association_id = $1 AND id = $2
            "#,
        )
        .bind(membership.association_id.as_uuid())
        .bind(membership.membership_id.as_uuid())
        .bind(membership.display_name.as_str())
        .bind(membership.is_admin)
        .bind(Json(&membership.assigned_roles))
        .bind(Json(&membership.overrides.granted))
        .bind(Json(&membership.overrides.revoked))
        .bind(membership.legacy_role.map(|role| role.as_str()))
        .bind(membership.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update membership: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "membership '{}'",
                membership.membership_id
            )));
        }

        Ok(())
    }

    async fn replace_roles_with_eviction(
        &self,
        association_id: AssociationId,
        membership_id: MembershipId,
        roles: BTreeSet<RoleId>,
        unique_roles: Vec<RoleId>,
    ) -> AppResult<Membership> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        for role_id in &unique_roles {
            sqlx::query(
                r#"
                UPDATE association_memberships
                SET assigned_roles = assigned_roles - $2, updated_at = now()
                WHERE association_id = $1 AND id <> $3 AND assigned_roles @> $4
                "#,
            )
            .bind(association_id.as_uuid())
            .bind(role_id.to_string())
            .bind(membership_id.as_uuid())
            .bind(Json([role_id]))
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to evict unique role holder: {error}"))
            })?;
        }

        let result = sqlx::query(
            r#"
            UPDATE association_memberships
            SET assigned_roles = $3, updated_at = now()
            WHERE association_id = $1 AND id = $2
            "#,
        )
        .bind(association_id.as_uuid())
        .bind(membership_id.as_uuid())
        .bind(Json(&roles))
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to replace roles: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("membership '{membership_id}'")));
        }

        let row = fetch_by_id(&mut transaction, association_id, membership_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("membership '{membership_id}'")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        row.into_membership()
    }

    async fn transfer_admin(
        &self,
        association_id: AssociationId,
        from: MembershipId,
        to: MembershipId,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        // The guard and the demotion are one statement; a concurrent
        // transfer that already moved the flag makes this affect zero rows.
        let demoted = sqlx::query(
            r#"
            UPDATE association_memberships
            SET is_admin = FALSE, updated_at = now()
            WHERE association_id = $1 AND id = $2 AND is_admin = TRUE
            "#,
        )
        .bind(association_id.as_uuid())
        .bind(from.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to release admin flag: {error}")))?;

        if demoted.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "admin authority was transferred concurrently".to_owned(),
            ));
        }

        let promoted = sqlx::query(
            r#"
            UPDATE association_memberships
            SET is_admin = TRUE, updated_at = now()
            WHERE association_id = $1 AND id = $2
            "#,
        )
        .bind(association_id.as_uuid())
        .bind(to.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to assign admin flag: {error}")))?;

        if promoted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("membership '{to}'")));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn list_members(&self, association_id: AssociationId) -> AppResult<Vec<Membership>> {
        let rows = sqlx::query_as::<_, MembershipRow>(&format!(
            "{SELECT_MEMBERSHIP} WHERE association_id = $1 ORDER BY joined_at"
        ))
        .bind(association_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list memberships: {error}")))?;

        rows.into_iter().map(MembershipRow::into_membership).collect()
    }
}
