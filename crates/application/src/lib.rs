//! Application services and repository ports.
//!
//! Services orchestrate domain logic over [`access_ports`] traits and
//! never touch a concrete database or cache. Adapters live in the
//! infrastructure crate; the API crate wires both together.

pub mod access_ports;
pub mod access_service;
pub mod membership_service;
pub mod role_admin_service;

#[cfg(test)]
mod test_support;

pub use access_ports::{
    AssociationRepository, AuditEvent, AuditRepository, AuthenticationProvider, CreateRoleInput,
    MembershipRepository, PermissionCache, PermissionCatalogRepository, RoleRepository,
    UpdateRoleInput,
};
pub use access_service::AccessService;
pub use membership_service::MembershipService;
pub use role_admin_service::{MemberRolesView, RoleAdminService};
