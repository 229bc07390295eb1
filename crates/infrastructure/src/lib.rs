//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_otp_provider;
mod noop_permission_cache;
mod postgres_association_repository;
mod postgres_audit_repository;
mod postgres_catalog_repository;
mod postgres_membership_repository;
mod postgres_role_repository;
mod redis_permission_cache;

pub use console_otp_provider::ConsoleOtpProvider;
pub use noop_permission_cache::NoopPermissionCache;
pub use postgres_association_repository::PostgresAssociationRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_catalog_repository::PostgresCatalogRepository;
pub use postgres_membership_repository::PostgresMembershipRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use redis_permission_cache::RedisPermissionCache;
