use serde::Serialize;

use gatehouse_core::{DomainError, DomainResult};

use crate::{Identity, ObjectChecker, Owned, Permission, Policy, PolicyHandle};

/// Role-level check: does `(identity.role, required)` have a grant?
///
/// - No IO
/// - No panics
/// - Unknown roles and missing grants are the same `PermissionDenied`
pub fn authorize(policy: &Policy, identity: &Identity, required: &Permission) -> DomainResult<()> {
    if policy.is_granted(&identity.role, required) {
        Ok(())
    } else {
        Err(DomainError::permission_denied(required.as_str()))
    }
}

/// Object-level check: walk the chain for `required`, first allow wins.
///
/// An empty chain denies.
pub fn authorize_object(
    policy: &Policy,
    identity: &Identity,
    required: &Permission,
    object: Option<&dyn Owned>,
) -> DomainResult<()> {
    if policy
        .chain(required)
        .iter()
        .any(|checker| checker.check(identity, object))
    {
        Ok(())
    } else {
        Err(DomainError::permission_denied(required.as_str()))
    }
}

/// Permission evaluator over the current policy snapshot.
///
/// Business operations call [`Authorizer::require_permission`] and then
/// [`Authorizer::require_object_permission`] before reading or mutating a resource.
#[derive(Debug, Clone)]
pub struct Authorizer {
    policy: PolicyHandle,
}

impl Authorizer {
    pub fn new(policy: PolicyHandle) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PolicyHandle {
        &self.policy
    }

    pub fn require_permission(&self, identity: &Identity, required: &Permission) -> DomainResult<()> {
        authorize(&self.policy.snapshot(), identity, required).inspect_err(|_| {
            tracing::debug!(role = %identity.role, permission = %required, "role lacks permission");
        })
    }

    pub fn require_object_permission(
        &self,
        identity: &Identity,
        required: &Permission,
        object: Option<&dyn Owned>,
    ) -> DomainResult<()> {
        authorize_object(&self.policy.snapshot(), identity, required, object).inspect_err(|_| {
            tracing::debug!(role = %identity.role, permission = %required, "object check denied");
        })
    }

    pub fn has_permission(&self, identity: &Identity, required: &Permission) -> bool {
        self.require_permission(identity, required).is_ok()
    }

    pub fn has_object_permission(&self, identity: &Identity, required: &Permission, object: Option<&dyn Owned>) -> bool {
        self.require_object_permission(identity, required, object).is_ok()
    }

    /// Both checks, against one snapshot, with a trace of the decision.
    pub fn explain(&self, identity: &Identity, required: &Permission, object: Option<&dyn Owned>) -> AuthorizationExplanation {
        explain_authorization(&self.policy.snapshot(), identity, required, object)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    /// The permission that was being checked.
    pub required_permission: String,

    /// Whether the authorization was granted.
    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    /// Role the decision was made for.
    pub role: String,

    /// The chain that was evaluated, in order.
    pub chain: Vec<ObjectChecker>,

    /// Index into `chain` of the checker that allowed, if any.
    pub allowed_by: Option<usize>,

    /// If denied, this explains what was missing.
    pub denial_reason: Option<DenialKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    MissingGrant,
    EmptyChain,
    AllCheckersDenied,
}

/// Explain why an authorization decision was made (or would be made).
///
/// Intended for audit/debug tooling only; never return this to the caller
/// being denied.
pub fn explain_authorization(
    policy: &Policy,
    identity: &Identity,
    required: &Permission,
    object: Option<&dyn Owned>,
) -> AuthorizationExplanation {
    let chain = policy.chain(required).to_vec();
    let denied = |reason: String, kind: DenialKind, chain: Vec<ObjectChecker>| AuthorizationExplanation {
        required_permission: required.to_string(),
        granted: false,
        reason,
        role: identity.role.to_string(),
        chain,
        allowed_by: None,
        denial_reason: Some(kind),
    };

    if !policy.is_granted(&identity.role, required) {
        return denied(
            format!("role '{}' has no grant for '{}'", identity.role, required),
            DenialKind::MissingGrant,
            chain,
        );
    }
    if chain.is_empty() {
        return denied(
            format!("no object checkers registered for '{required}'"),
            DenialKind::EmptyChain,
            chain,
        );
    }

    match chain.iter().position(|checker| checker.check(identity, object)) {
        Some(index) => AuthorizationExplanation {
            required_permission: required.to_string(),
            granted: true,
            reason: format!("allowed by checker #{index} ({})", chain[index]),
            role: identity.role.to_string(),
            chain,
            allowed_by: Some(index),
            denial_reason: None,
        },
        None => denied(
            format!("all {} checkers denied", chain.len()),
            DenialKind::AllCheckersDenied,
            chain,
        ),
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_core::{ErrorCode, UserId};

    use super::*;
    use crate::Role;

    const LIST: Permission = Permission::from_static("doc_list");
    const UPDATE: Permission = Permission::from_static("doc_update");
    const ARCHIVE: Permission = Permission::from_static("doc_archive");
    const PURGE: Permission = Permission::from_static("doc_purge");

    struct Doc {
        owner: UserId,
    }

    impl Owned for Doc {
        fn owner_id(&self) -> Option<UserId> {
            Some(self.owner)
        }
    }

    fn policy() -> Policy {
        Policy::new()
            .grant(Role::GUEST, [LIST])
            .grant(Role::new("user"), [LIST, UPDATE, ARCHIVE])
            .grant(Role::new("admin"), [LIST, UPDATE, ARCHIVE, PURGE])
            .check(LIST, [ObjectChecker::AlwaysAllow])
            .check(UPDATE, [ObjectChecker::OwnerOnly, ObjectChecker::role_is(Role::new("admin"))])
            .check(ARCHIVE, [ObjectChecker::NeverAllow, ObjectChecker::OwnerOrAbsent])
    }

    fn authorizer() -> Authorizer {
        Authorizer::new(PolicyHandle::new(policy()))
    }

    fn identity(role: &'static str) -> Identity {
        Identity::new(UserId::new(), Role::new(role), role, role)
    }

    #[test]
    fn has_permission_is_exact_over_grant_table() {
        let policy = policy();
        let authz = authorizer();
        let roles = [Role::GUEST, Role::new("user"), Role::new("admin"), Role::new("ghost")];
        let perms = [LIST, UPDATE, ARCHIVE, PURGE];

        for role in &roles {
            let who = Identity::new(UserId::new(), role.clone(), "x", "x");
            for perm in &perms {
                assert_eq!(
                    authz.has_permission(&who, perm),
                    policy.is_granted(role, perm),
                    "{role} / {perm}"
                );
            }
        }
        assert!(!authz.has_permission(&identity("ghost"), &LIST));
    }

    #[test]
    fn missing_grant_and_unknown_role_look_the_same() {
        let authz = authorizer();
        let unknown = authz.require_permission(&identity("ghost"), &PURGE).unwrap_err();
        let missing = authz.require_permission(&identity("user"), &PURGE).unwrap_err();
        assert_eq!(unknown, missing);
        assert_eq!(unknown.code(), ErrorCode::PermissionDenied);
    }

    #[test]
    fn owner_only_chain() {
        let authz = authorizer();
        let alice = identity("user");
        let mine = Doc { owner: alice.id.unwrap() };
        let theirs = Doc { owner: UserId::new() };

        assert!(authz.has_object_permission(&alice, &UPDATE, Some(&mine)));
        assert!(!authz.has_object_permission(&alice, &UPDATE, Some(&theirs)));
        assert!(!authz.has_object_permission(&alice, &UPDATE, None));
        assert!(authz.has_object_permission(&identity("admin"), &UPDATE, Some(&theirs)));
    }

    #[test]
    fn later_checker_can_allow_after_deny() {
        let authz = authorizer();
        let alice = identity("user");
        assert!(authz.has_object_permission(&alice, &ARCHIVE, None));
        assert!(!authz.has_object_permission(&alice, &ARCHIVE, Some(&Doc { owner: UserId::new() })));
    }

    #[test]
    fn empty_chain_denies() {
        let authz = authorizer();
        let err = authz
            .require_object_permission(&identity("admin"), &PURGE, None)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PermissionDenied);
        assert_eq!(err.param("permission"), Some("doc_purge"));
    }

    #[test]
    fn anonymous_gets_guest_grants_only() {
        let authz = authorizer();
        let anon = Identity::anonymous();
        authz.require_permission(&anon, &LIST).unwrap();
        authz.require_object_permission(&anon, &LIST, None).unwrap();
        assert!(!authz.has_permission(&anon, &UPDATE));
    }

    #[test]
    fn explanation_names_the_allowing_checker() {
        let policy = policy();
        let admin = identity("admin");
        let theirs = Doc { owner: UserId::new() };

        let allowed = explain_authorization(&policy, &admin, &UPDATE, Some(&theirs));
        assert!(allowed.granted);
        assert_eq!(allowed.allowed_by, Some(1));

        let no_grant = explain_authorization(&policy, &identity("user"), &PURGE, None);
        assert_eq!(no_grant.denial_reason, Some(DenialKind::MissingGrant));

        let empty = explain_authorization(&policy, &admin, &PURGE, None);
        assert_eq!(empty.denial_reason, Some(DenialKind::EmptyChain));

        let denied = explain_authorization(&policy, &identity("user"), &UPDATE, Some(&theirs));
        assert_eq!(denied.denial_reason, Some(DenialKind::AllCheckersDenied));
    }

    #[test]
    fn reload_is_seen_by_next_call() {
        let authz = authorizer();
        let user = identity("user");
        assert!(!authz.has_permission(&user, &PURGE));

        authz.policy().publish(policy().grant(Role::new("user"), [PURGE]));
        assert!(authz.has_permission(&user, &PURGE));
    }
}
