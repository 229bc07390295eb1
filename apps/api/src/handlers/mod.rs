use std::collections::BTreeSet;

use amicale_core::{AppError, AppResult};
use amicale_domain::PermissionId;

pub mod associations;
pub mod health;
pub mod members;
pub mod permissions;
pub mod roles;

/// Parses transport permission strings into validated identifiers.
///
/// Malformed identifiers fail validation here; identifiers outside the
/// association catalog are rejected later by the services.
fn parse_permissions(values: &[String]) -> AppResult<BTreeSet<PermissionId>> {
    values
        .iter()
        .map(|value| {
            PermissionId::new(value.as_str())
                .map_err(|_| AppError::InvalidPermission(value.clone()))
        })
        .collect()
}
