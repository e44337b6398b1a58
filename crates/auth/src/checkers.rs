//! Object-level permission checkers.
//!
//! A checker decides allow/deny for one `(identity, object)` pair. Checkers are
//! a closed set of variants so a registered chain can be listed, compared and
//! serialized for audit.

use serde::{Deserialize, Serialize};

use gatehouse_core::{ResourceId, UserId};

use crate::{Identity, Role};

/// Ownership capability exposed by resource types.
///
/// A resource either *is* a user-owned principal (its own id is compared to the
/// caller) or references one through a foreign owner id. Owner checks try
/// [`Owned::object_id`] first and fall back to [`Owned::owner_id`].
pub trait Owned {
    fn object_id(&self) -> Option<ResourceId> {
        None
    }

    fn owner_id(&self) -> Option<UserId> {
        None
    }
}

/// One link of a per-permission checker chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectChecker {
    /// Allow regardless of object or caller.
    AlwaysAllow,
    /// Deny regardless of object or caller.
    NeverAllow,
    /// Allow when the caller owns the object; deny when the object is absent.
    OwnerOnly,
    /// Allow when the object is absent, otherwise require ownership.
    OwnerOrAbsent,
    /// Allow only when the object is absent.
    AllowIfAbsent,
    /// Allow when the caller holds the given role.
    RoleIs { role: Role },
}

impl ObjectChecker {
    pub fn role_is(role: Role) -> Self {
        Self::RoleIs { role }
    }

    /// Evaluate this checker. Pure: no IO, no state.
    pub fn check(&self, identity: &Identity, object: Option<&dyn Owned>) -> bool {
        match self {
            ObjectChecker::AlwaysAllow => true,
            ObjectChecker::NeverAllow => false,
            ObjectChecker::OwnerOnly => object.is_some_and(|o| is_owner(identity, o)),
            ObjectChecker::OwnerOrAbsent => object.is_none_or(|o| is_owner(identity, o)),
            ObjectChecker::AllowIfAbsent => object.is_none(),
            ObjectChecker::RoleIs { role } => identity.role == *role,
        }
    }
}

impl core::fmt::Display for ObjectChecker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ObjectChecker::AlwaysAllow => f.write_str("always_allow"),
            ObjectChecker::NeverAllow => f.write_str("never_allow"),
            ObjectChecker::OwnerOnly => f.write_str("owner_only"),
            ObjectChecker::OwnerOrAbsent => f.write_str("owner_or_absent"),
            ObjectChecker::AllowIfAbsent => f.write_str("allow_if_absent"),
            ObjectChecker::RoleIs { role } => write!(f, "role_is({role})"),
        }
    }
}

/// The anonymous identity never owns anything.
fn is_owner(identity: &Identity, object: &dyn Owned) -> bool {
    let Some(caller) = identity.id else {
        return false;
    };
    if object.object_id().is_some_and(|id| id == caller) {
        return true;
    }
    object.owner_id() == Some(caller)
}
