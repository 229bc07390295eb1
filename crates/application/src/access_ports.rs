//! Repository and provider ports consumed by the application services.

mod associations;
mod audit;
mod auth;
mod cache;
mod catalog;
mod memberships;
mod roles;

pub use associations::AssociationRepository;
pub use audit::{AuditEvent, AuditRepository};
pub use auth::AuthenticationProvider;
pub use cache::PermissionCache;
pub use catalog::PermissionCatalogRepository;
pub use memberships::MembershipRepository;
pub use roles::{CreateRoleInput, RoleRepository, UpdateRoleInput};
