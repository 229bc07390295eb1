use std::collections::{BTreeSet, HashMap};

use crate::legacy::LegacyRole;
use crate::membership::Membership;
use crate::permission::{PermissionDefinition, PermissionId};
use crate::role::{Role, RoleId};

/// Lookup view over an association's role definitions, as loaded for one
/// resolution pass.
#[derive(Debug, Clone, Default)]
pub struct RoleSet {
    roles: HashMap<RoleId, Role>,
}

impl RoleSet {
    /// Builds a lookup view from loaded role definitions.
    #[must_use]
    pub fn from_roles(roles: Vec<Role>) -> Self {
        Self {
            roles: roles
                .into_iter()
                .map(|role| (role.role_id, role))
                .collect(),
        }
    }

    /// Returns the role definition for an identifier, when present.
    #[must_use]
    pub fn get(&self, role_id: RoleId) -> Option<&Role> {
        self.roles.get(&role_id)
    }

    /// Returns whether a role identifier is defined.
    #[must_use]
    pub fn contains(&self, role_id: RoleId) -> bool {
        self.roles.contains_key(&role_id)
    }

    /// Returns the names of the roles a membership currently holds.
    ///
    /// Dangling identifiers (role deleted since assignment) are skipped.
    #[must_use]
    pub fn role_names_for(&self, membership: &Membership) -> Vec<String> {
        membership
            .assigned_roles
            .iter()
            .filter_map(|role_id| self.roles.get(role_id))
            .map(|role| role.name.clone())
            .collect()
    }
}

/// Outcome of one permission resolution, recording which layer decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Allowed by the unconditional admin override.
    AllowedAdmin,
    /// Allowed by an explicit per-member grant.
    AllowedGrant,
    /// Allowed by an assigned role carrying the permission.
    AllowedRole,
    /// Denied by an explicit per-member revoke.
    DeniedRevoked,
    /// Denied: no layer granted the permission.
    Denied,
}

impl Resolution {
    /// Returns whether the outcome allows the action.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(
            self,
            Self::AllowedAdmin | Self::AllowedGrant | Self::AllowedRole
        )
    }
}

/// Resolves one permission for a membership under the catalog model.
///
/// Layers are consulted in strict precedence order and the first matching
/// layer decides: admin override, explicit grant, explicit revoke,
/// role-derived, default deny. The admin override deliberately ignores
/// explicit revokes so that admin authority cannot be reduced by
/// misconfigured overrides.
#[must_use]
pub fn resolve_permission(
    membership: &Membership,
    roles: &RoleSet,
    permission: &PermissionId,
) -> Resolution {
    if membership.is_admin {
        return Resolution::AllowedAdmin;
    }

    if membership.overrides.granted.contains(permission) {
        return Resolution::AllowedGrant;
    }

    if membership.overrides.revoked.contains(permission) {
        return Resolution::DeniedRevoked;
    }

    let role_grants = membership
        .assigned_roles
        .iter()
        .filter_map(|role_id| roles.get(*role_id))
        .any(|role| role.permissions.contains(permission));
    if role_grants {
        return Resolution::AllowedRole;
    }

    Resolution::Denied
}

/// Returns whether a membership has a permission under the catalog model.
#[must_use]
pub fn has_permission(
    membership: &Membership,
    roles: &RoleSet,
    permission: &PermissionId,
) -> bool {
    resolve_permission(membership, roles, permission).is_allowed()
}

/// Computes the full effective permission set of a membership.
///
/// Admins hold the entire catalog, including permissions no role carries.
/// Everyone else holds the union of their role permissions and direct
/// grants, minus direct revokes.
#[must_use]
pub fn effective_permissions(
    membership: &Membership,
    roles: &RoleSet,
    catalog: &[PermissionDefinition],
) -> BTreeSet<PermissionId> {
    if membership.is_admin {
        return catalog.iter().map(|entry| entry.id.clone()).collect();
    }

    let mut effective: BTreeSet<PermissionId> = membership
        .assigned_roles
        .iter()
        .filter_map(|role_id| roles.get(*role_id))
        .flat_map(|role| role.permissions.iter().cloned())
        .collect();

    effective.extend(membership.overrides.granted.iter().cloned());
    for revoked in &membership.overrides.revoked {
        effective.remove(revoked);
    }

    effective
}

/// Returns whether a membership satisfies a legacy role requirement.
///
/// The admin flag implicitly satisfies any legacy check, mirroring the
/// admin override of the catalog model.
#[must_use]
pub fn has_legacy_role(membership: &Membership, required: LegacyRole) -> bool {
    if membership.is_admin {
        return true;
    }

    membership
        .legacy_role
        .is_some_and(|held| held.satisfies(required))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use amicale_core::AssociationId;
    use proptest::prelude::*;

    use crate::legacy::LegacyRole;
    use crate::membership::Membership;
    use crate::permission::{PermissionDefinition, PermissionId, default_catalog};
    use crate::role::{Role, RoleId};

    use super::{
        Resolution, RoleSet, effective_permissions, has_legacy_role, has_permission,
        resolve_permission,
    };

    fn permission(value: &str) -> PermissionId {
        PermissionId::new(value).unwrap_or_else(|_| unreachable!("valid test id"))
    }

    fn role(association_id: AssociationId, name: &str, permissions: &[&str]) -> Role {
        Role {
            role_id: RoleId::new(),
            association_id,
            name: name.to_owned(),
            description: String::new(),
            permissions: permissions.iter().map(|value| permission(value)).collect(),
            color: None,
            icon: None,
            is_unique: false,
        }
    }

    fn member_with_roles(association_id: AssociationId, roles: &[&Role]) -> Membership {
        let mut membership = Membership::join_request(association_id, "user-1", "Awa");
        membership.status = crate::membership::MembershipStatus::Active;
        membership.assigned_roles = roles.iter().map(|role| role.role_id).collect();
        membership
    }

    #[test]
    fn role_grants_permission_and_nothing_more() {
        let association_id = AssociationId::new();
        let treasurer = role(association_id, "treasurer", &["view_finances"]);
        let membership = member_with_roles(association_id, &[&treasurer]);
        let roles = RoleSet::from_roles(vec![treasurer]);

        assert!(has_permission(&membership, &roles, &permission("view_finances")));
        assert!(!has_permission(&membership, &roles, &permission("manage_members")));
    }

    #[test]
    fn explicit_revoke_beats_role_grant() {
        let association_id = AssociationId::new();
        let treasurer = role(association_id, "treasurer", &["view_finances"]);
        let mut membership = member_with_roles(association_id, &[&treasurer]);
        membership.revoke(permission("view_finances"));
        let roles = RoleSet::from_roles(vec![treasurer]);

        assert_eq!(
            resolve_permission(&membership, &roles, &permission("view_finances")),
            Resolution::DeniedRevoked
        );
    }

    #[test]
    fn explicit_grant_beats_standing_revoke() {
        let association_id = AssociationId::new();
        let mut membership = member_with_roles(association_id, &[]);
        membership.revoke(permission("manage_members"));
        membership.grant(permission("manage_members"));
        let roles = RoleSet::default();

        assert_eq!(
            resolve_permission(&membership, &roles, &permission("manage_members")),
            Resolution::AllowedGrant
        );
    }

    #[test]
    fn admin_override_ignores_revocations() {
        let association_id = AssociationId::new();
        let mut membership = member_with_roles(association_id, &[]);
        membership.is_admin = true;
        membership.revoke(permission("manage_roles"));
        let roles = RoleSet::default();

        assert_eq!(
            resolve_permission(&membership, &roles, &permission("manage_roles")),
            Resolution::AllowedAdmin
        );
    }

    #[test]
    fn admin_effective_set_is_the_full_catalog() {
        let association_id = AssociationId::new();
        let mut membership = member_with_roles(association_id, &[]);
        membership.is_admin = true;
        membership.revoke(permission("view_finances"));
        let catalog = default_catalog();

        let effective = effective_permissions(&membership, &RoleSet::default(), &catalog);
        assert_eq!(effective.len(), catalog.len());
        assert!(effective.contains(&permission("view_finances")));
    }

    #[test]
    fn effective_set_combines_roles_grants_and_revokes() {
        let association_id = AssociationId::new();
        let treasurer = role(association_id, "treasurer", &["view_finances"]);
        let mut membership = member_with_roles(association_id, &[&treasurer]);
        membership.revoke(permission("view_finances"));
        membership.grant(permission("manage_members"));
        let roles = RoleSet::from_roles(vec![treasurer]);

        let effective = effective_permissions(&membership, &roles, &default_catalog());
        let expected: BTreeSet<_> = [permission("manage_members")].into_iter().collect();
        assert_eq!(effective, expected);
    }

    #[test]
    fn dangling_role_ids_resolve_to_nothing() {
        let association_id = AssociationId::new();
        let ghost = role(association_id, "ghost", &["view_finances"]);
        let membership = member_with_roles(association_id, &[&ghost]);
        // Role deleted since assignment: empty role set.
        let roles = RoleSet::default();

        assert!(!has_permission(&membership, &roles, &permission("view_finances")));
        assert!(roles.role_names_for(&membership).is_empty());
    }

    #[test]
    fn legacy_check_respects_hierarchy_and_admin() {
        let association_id = AssociationId::new();
        let mut membership = member_with_roles(association_id, &[]);
        membership.legacy_role = Some(LegacyRole::President);
        assert!(has_legacy_role(&membership, LegacyRole::Treasurer));

        membership.legacy_role = Some(LegacyRole::Member);
        assert!(!has_legacy_role(&membership, LegacyRole::Treasurer));

        membership.legacy_role = None;
        membership.is_admin = true;
        assert!(has_legacy_role(&membership, LegacyRole::President));
    }

    fn permission_id_strategy() -> impl Strategy<Value = PermissionId> {
        prop::sample::select(
            default_catalog()
                .into_iter()
                .map(|entry| entry.id)
                .collect::<Vec<_>>(),
        )
    }

    proptest! {
        #[test]
        fn admin_supremacy_holds_for_any_overrides(
            revoked in prop::collection::btree_set(permission_id_strategy(), 0..8),
            probe in permission_id_strategy(),
        ) {
            let association_id = AssociationId::new();
            let mut membership = member_with_roles(association_id, &[]);
            membership.is_admin = true;
            for id in revoked {
                membership.revoke(id);
            }

            prop_assert!(has_permission(&membership, &RoleSet::default(), &probe));
        }

        #[test]
        fn effective_set_matches_union_minus_revokes(
            role_perms in prop::collection::btree_set(permission_id_strategy(), 0..8),
            granted in prop::collection::btree_set(permission_id_strategy(), 0..4),
            revoked in prop::collection::btree_set(permission_id_strategy(), 0..4),
        ) {
            let association_id = AssociationId::new();
            let bundle = Role {
                role_id: RoleId::new(),
                association_id,
                name: "bundle".to_owned(),
                description: String::new(),
                permissions: role_perms.clone(),
                color: None,
                icon: None,
                is_unique: false,
            };
            let mut membership = member_with_roles(association_id, &[&bundle]);
            for id in &granted {
                membership.grant(id.clone());
            }
            for id in &revoked {
                membership.revoke(id.clone());
            }
            let roles = RoleSet::from_roles(vec![bundle]);

            // Revokes applied last strip earlier grants, so the expected
            // set uses the overrides as they ended up, not the raw inputs.
            let mut expected: BTreeSet<PermissionId> = role_perms;
            expected.extend(membership.overrides.granted.iter().cloned());
            for id in &membership.overrides.revoked {
                expected.remove(id);
            }

            let effective = effective_permissions(&membership, &roles, &default_catalog());
            prop_assert_eq!(effective, expected);

            // Point checks agree with the set computation.
            for entry in default_catalog() {
                let allowed = has_permission(&membership, &roles, &entry.id);
                let in_set = effective_permissions(&membership, &roles, &default_catalog())
                    .contains(&entry.id);
                prop_assert_eq!(allowed, in_set);
            }
        }
    }
}
