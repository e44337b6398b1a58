use serde::{Deserialize, Serialize};

use gatehouse_core::UserId;

use crate::Role;

/// A resolved principal, as seen by authorization decisions.
///
/// `id` is `None` only for the anonymous identity; an anonymous caller can
/// never match an ownership check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Option<UserId>,
    pub role: Role,
    pub login_id: String,
    pub display_name: String,
}

impl Identity {
    pub fn new(id: UserId, role: Role, login_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            role,
            login_id: login_id.into(),
            display_name: display_name.into(),
        }
    }

    /// Identity attached to calls that carry no credential.
    ///
    /// Built fresh for every call and never persisted.
    pub fn anonymous() -> Self {
        Self {
            id: None,
            role: Role::GUEST,
            login_id: String::new(),
            display_name: String::new(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }
}

/// Stored form of an identity, as returned by an [`crate::IdentityStore`].
///
/// Carries the password hash, which must never leave the credential service.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub id: UserId,
    pub login_id: String,
    pub display_name: String,
    pub role: Role,
    pub password_hash: String,
}

impl IdentityRecord {
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.role.clone(), self.login_id.clone(), self.display_name.clone())
    }
}

impl core::fmt::Debug for IdentityRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityRecord")
            .field("id", &self.id)
            .field("login_id", &self.login_id)
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl From<IdentityRecord> for Identity {
    fn from(record: IdentityRecord) -> Self {
        Identity::new(record.id, record.role, record.login_id, record.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_guest_without_id() {
        let anon = Identity::anonymous();
        assert!(anon.is_anonymous());
        assert!(anon.role.is_guest());
        assert!(anon.login_id.is_empty());
    }

    #[test]
    fn record_debug_hides_password_hash() {
        let record = IdentityRecord {
            id: UserId::new(),
            login_id: "alice".to_string(),
            display_name: "Alice".to_string(),
            role: Role::new("user"),
            password_hash: "sha256$00$secret-material".to_string(),
        };

        let printed = format!("{record:?}");
        assert!(printed.contains("alice"));
        assert!(!printed.contains("secret-material"));
        assert_eq!(Identity::from(record.clone()), record.identity());
    }
}
