//! Redis-backed effective permission cache.

use std::collections::BTreeSet;

use amicale_application::PermissionCache;
use amicale_core::{AppError, AppResult, AssociationId};
use amicale_domain::PermissionId;
use async_trait::async_trait;
use redis::AsyncCommands;

/// Redis implementation of the effective permission cache port.
///
/// Association-wide invalidation bumps a per-association generation
/// counter instead of scanning for keys: entries written under the old
/// generation become unreachable and expire on their own TTL.
#[derive(Clone)]
pub struct RedisPermissionCache {
    client: redis::Client,
    key_prefix: String,
    ttl_seconds: u64,
}

impl RedisPermissionCache {
    /// Creates a cache adapter with a configured Redis client, key prefix
    /// and entry TTL.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>, ttl_seconds: u64) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
            ttl_seconds,
        }
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }

    fn generation_key(&self, association_id: AssociationId) -> String {
        format!("{}:gen:{}", self.key_prefix, association_id)
    }

    async fn entry_key(
        &self,
        connection: &mut redis::aio::MultiplexedConnection,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<String> {
        let generation: Option<u64> = connection
            .get(self.generation_key(association_id))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read cache generation: {error}"))
            })?;

        Ok(format!(
            "{}:eff:{}:{}:{}",
            self.key_prefix,
            association_id,
            generation.unwrap_or(0),
            subject
        ))
    }

    fn encode(permissions: &BTreeSet<PermissionId>) -> String {
        permissions
            .iter()
            .map(PermissionId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn decode(value: &str) -> AppResult<BTreeSet<PermissionId>> {
        if value.is_empty() {
            return Ok(BTreeSet::new());
        }
        value.split(',').map(PermissionId::new).collect()
    }
}

#[async_trait]
impl PermissionCache for RedisPermissionCache {
    async fn get_effective(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<Option<BTreeSet<PermissionId>>> {
        let mut connection = self.connection().await?;
        let key = self.entry_key(&mut connection, association_id, subject).await?;

        let encoded: Option<String> = connection.get(key).await.map_err(|error| {
            AppError::Internal(format!("failed to read permission cache entry: {error}"))
        })?;

        encoded.as_deref().map(Self::decode).transpose()
    }

    async fn put_effective(
        &self,
        association_id: AssociationId,
        subject: &str,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<()> {
        if self.ttl_seconds == 0 {
            return Ok(());
        }

        let mut connection = self.connection().await?;
        let key = self.entry_key(&mut connection, association_id, subject).await?;

        connection
            .set_ex(key, Self::encode(permissions), self.ttl_seconds)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to write permission cache entry: {error}"))
            })
    }

    async fn invalidate_member(
        &self,
        association_id: AssociationId,
        subject: &str,
    ) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let key = self.entry_key(&mut connection, association_id, subject).await?;

        connection.del(key).await.map_err(|error| {
            AppError::Internal(format!("failed to drop permission cache entry: {error}"))
        })
    }

    async fn invalidate_association(&self, association_id: AssociationId) -> AppResult<()> {
        let mut connection = self.connection().await?;

        connection
            .incr(self.generation_key(association_id), 1u64)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to bump cache generation: {error}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use amicale_domain::PermissionId;

    use super::RedisPermissionCache;

    fn permission(value: &str) -> PermissionId {
        PermissionId::new(value).unwrap_or_else(|_| unreachable!("valid test permission id"))
    }

    #[test]
    fn encoding_round_trips_a_permission_set() {
        let permissions: BTreeSet<PermissionId> =
            [permission("manage_members"), permission("view_finances")]
                .into_iter()
                .collect();

        let encoded = RedisPermissionCache::encode(&permissions);
        let decoded =
            RedisPermissionCache::decode(&encoded).unwrap_or_else(|error| panic!("{error}"));
        assert_eq!(decoded, permissions);
    }

    #[test]
    fn empty_value_decodes_to_the_empty_set() {
        let decoded = RedisPermissionCache::decode("").unwrap_or_else(|error| panic!("{error}"));
        assert!(decoded.is_empty());
    }

    #[test]
    fn corrupt_values_fail_decoding() {
        assert!(RedisPermissionCache::decode("Not A Permission").is_err());
    }
}
