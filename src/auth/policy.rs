// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role and ownership checks.
//!
//! Every check is a pure function over an explicit principal and, for
//! ownership, an explicit [`ResourceLookup`]. Nothing here reads ambient
//! request state.
//!
//! ## Decision Rules
//!
//! - Role names compare case-insensitively (`"ADMIN"` grants `"admin"`)
//! - An unknown resource is never owned, not even by an admin
//! - Admins bypass ownership only where the caller allows it

use super::{AuthError, AuthenticatedPrincipal, UserId};
use crate::models::ResourceId;

/// Role name that grants administrative access.
pub const ADMIN_ROLE: &str = "admin";

/// Role granted to every self-registered user.
pub const USER_ROLE: &str = "USER";

/// A resource with exactly one owning user.
pub trait OwnedResource {
    /// Get the owner's user ID.
    fn owner_id(&self) -> UserId;
}

/// Read access to the resource ownership relation.
///
/// Implementations must answer from current storage; callers never cache.
pub trait ResourceLookup {
    type Resource: OwnedResource;

    fn find(&self, id: ResourceId) -> Option<Self::Resource>;
}

/// Whether the principal holds `role` (case-insensitive).
pub fn has_role(principal: &AuthenticatedPrincipal, role: &str) -> bool {
    let wanted = role.to_lowercase();
    principal
        .roles
        .iter()
        .any(|granted| granted.to_lowercase() == wanted)
}

pub fn is_admin(principal: &AuthenticatedPrincipal) -> bool {
    has_role(principal, ADMIN_ROLE)
}

/// Whether the principal may act on resource `id` as its owner.
pub fn owns_resource<L: ResourceLookup + ?Sized>(
    principal: &AuthenticatedPrincipal,
    id: ResourceId,
    lookup: &L,
    admin_bypasses: bool,
) -> bool {
    let Some(resource) = lookup.find(id) else {
        return false;
    };

    if admin_bypasses && is_admin(principal) {
        return true;
    }

    resource.owner_id() == principal.user_id
}

/// # Errors
/// [`AuthError::InsufficientRole`] when the role is not granted.
pub fn require_role(principal: &AuthenticatedPrincipal, role: &str) -> Result<(), AuthError> {
    if has_role(principal, role) {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole(role.to_string()))
    }
}

pub fn require_admin(principal: &AuthenticatedPrincipal) -> Result<(), AuthError> {
    require_role(principal, ADMIN_ROLE)
}

/// Ownership check in `Result` form.
///
/// Callers that need to distinguish "not found" from "not yours" must look
/// the resource up first; this only answers allow or deny.
pub fn require_owner<L: ResourceLookup + ?Sized>(
    principal: &AuthenticatedPrincipal,
    id: ResourceId,
    lookup: &L,
    admin_bypasses: bool,
) -> Result<(), AuthError> {
    if owns_resource(principal, id, lookup, admin_bypasses) {
        Ok(())
    } else {
        Err(AuthError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Clone)]
    struct Note {
        owner: UserId,
    }

    impl OwnedResource for Note {
        fn owner_id(&self) -> UserId {
            self.owner
        }
    }

    struct Notes(HashMap<ResourceId, Note>);

    impl ResourceLookup for Notes {
        type Resource = Note;

        fn find(&self, id: ResourceId) -> Option<Note> {
            self.0.get(&id).cloned()
        }
    }

    fn principal(user_id: UserId, roles: &[&str]) -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            username: format!("user{user_id}"),
            user_id,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn notes() -> Notes {
        Notes(HashMap::from([(1, Note { owner: 5 })]))
    }

    #[test]
    fn owner_owns_resource() {
        assert!(owns_resource(&principal(5, &["USER"]), 1, &notes(), false));
    }

    #[test]
    fn other_user_does_not_own_resource() {
        assert!(!owns_resource(&principal(6, &["USER"]), 1, &notes(), true));
    }

    #[test]
    fn admin_bypasses_only_when_allowed() {
        let admin = principal(6, &["USER", "ADMIN"]);
        assert!(owns_resource(&admin, 1, &notes(), true));
        assert!(!owns_resource(&admin, 1, &notes(), false));
    }

    #[test]
    fn missing_resource_is_never_owned() {
        let admin = principal(5, &["ADMIN"]);
        assert!(!owns_resource(&admin, 99, &notes(), true));
    }

    #[test]
    fn roles_compare_case_insensitively() {
        let p = principal(1, &["USER", "ADMIN"]);
        assert!(has_role(&p, "user"));
        assert!(has_role(&p, "Admin"));
        assert!(is_admin(&p));
        assert!(!has_role(&p, "auditor"));
    }

    #[test]
    fn empty_roles_grant_nothing() {
        let p = principal(1, &[]);
        assert!(!is_admin(&p));
        assert!(!has_role(&p, USER_ROLE));
    }

    #[test]
    fn require_forms_map_to_authorization_errors() {
        let p = principal(6, &["USER"]);
        assert_eq!(
            require_admin(&p),
            Err(AuthError::InsufficientRole("admin".into()))
        );
        assert_eq!(require_role(&p, "user"), Ok(()));
        assert_eq!(require_owner(&p, 1, &notes(), true), Err(AuthError::NotOwner));
        assert_eq!(require_owner(&principal(5, &[]), 1, &notes(), false), Ok(()));
    }
}
