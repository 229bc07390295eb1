//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod association;
mod audit;
mod legacy;
mod membership;
mod permission;
mod resolver;
mod role;

pub use association::{Association, PermissionModel};
pub use audit::AuditAction;
pub use legacy::LegacyRole;
pub use membership::{Membership, MembershipId, MembershipStatus, PermissionOverrides};
pub use permission::{
    PermissionCategory, PermissionDefinition, PermissionId, default_catalog,
};
pub use resolver::{
    Resolution, RoleSet, effective_permissions, has_legacy_role, has_permission,
    resolve_permission,
};
pub use role::{Role, RoleId};
