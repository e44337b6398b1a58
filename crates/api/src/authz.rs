//! API-side authorization guard for resource handlers.
//!
//! Every business action runs the role check first, then the object check,
//! against the same identity, before it reads or mutates anything.

use gatehouse_auth::{Authorizer, Identity, Owned, Permission};
use gatehouse_core::DomainResult;

/// Gate an action on an existing object.
///
/// The object is only loaded once the role check passed, and only returned
/// once the object check passed.
pub fn authorize_on<T, F>(
    authorizer: &Authorizer,
    identity: &Identity,
    permission: &Permission,
    load: F,
) -> DomainResult<T>
where
    T: Owned,
    F: FnOnce() -> DomainResult<T>,
{
    authorizer.require_permission(identity, permission)?;
    let object = load()?;
    authorizer.require_object_permission(identity, permission, Some(&object))?;
    Ok(object)
}

/// Gate an action with no target object (create, list).
pub fn authorize(authorizer: &Authorizer, identity: &Identity, permission: &Permission) -> DomainResult<()> {
    authorizer.require_permission(identity, permission)?;
    authorizer.require_object_permission(identity, permission, None)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use gatehouse_auth::{ObjectChecker, Policy, PolicyHandle, Role};
    use gatehouse_core::{DomainError, ErrorCode, UserId};

    use super::*;

    const EDIT: Permission = Permission::from_static("thing_edit");

    struct Thing(UserId);

    impl Owned for Thing {
        fn owner_id(&self) -> Option<UserId> {
            Some(self.0)
        }
    }

    fn authorizer() -> Authorizer {
        Authorizer::new(PolicyHandle::new(
            Policy::new()
                .grant(Role::new("user"), [EDIT])
                .check(EDIT, [ObjectChecker::OwnerOnly]),
        ))
    }

    #[test]
    fn role_check_runs_before_load() {
        let loaded = Cell::new(false);
        let err = authorize_on(&authorizer(), &Identity::anonymous(), &EDIT, || {
            loaded.set(true);
            Ok(Thing(UserId::new()))
        })
        .err()
        .unwrap();

        assert_eq!(err.code(), ErrorCode::PermissionDenied);
        assert!(!loaded.get());
    }

    #[test]
    fn load_errors_pass_through() {
        let me = Identity::new(UserId::new(), Role::new("user"), "me", "Me");
        let err = authorize_on::<Thing, _>(&authorizer(), &me, &EDIT, || Err(DomainError::not_found("thing", "t-1")))
            .err()
            .unwrap();
        assert_eq!(err.code(), ErrorCode::ResourceNotFound);
    }

    #[test]
    fn object_check_applies_after_load() {
        let me = Identity::new(UserId::new(), Role::new("user"), "me", "Me");
        let mine = authorize_on(&authorizer(), &me, &EDIT, || Ok(Thing(me.id.unwrap())));
        assert!(mine.is_ok());

        let theirs = authorize_on(&authorizer(), &me, &EDIT, || Ok(Thing(UserId::new())));
        assert_eq!(theirs.err().unwrap().code(), ErrorCode::PermissionDenied);

        // Owner-only with no object denies.
        assert!(authorize(&authorizer(), &me, &EDIT).is_err());
    }
}
