//! Service wiring: identity store, credential service, authorizer, resource stores.

use std::sync::Arc;

use gatehouse_auth::{
    AuthConfig, Authorizer, CredentialService, Identity, IdentityRecord, IdentityResolver, InMemoryIdentityStore,
    PasswordVerifier, Policy, PolicyHandle, Role, Sha256PasswordVerifier,
};
use gatehouse_core::{DomainResult, UserId};

use crate::app::notes::NoteStore;
use crate::middleware::AuthState;

/// Everything the handlers need, shared read-only across calls.
pub struct AppServices {
    pub credentials: Arc<CredentialService>,
    pub authorizer: Authorizer,
    pub identities: Arc<InMemoryIdentityStore>,
    pub verifier: Arc<dyn PasswordVerifier>,
    pub notes: NoteStore,
}

impl AppServices {
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            credentials: self.credentials.clone(),
        }
    }

    /// Create (or replace) a user with a freshly hashed secret.
    pub fn register_user(
        &self,
        login_id: &str,
        display_name: &str,
        role: Role,
        secret: &str,
    ) -> DomainResult<Identity> {
        let record = IdentityRecord {
            id: UserId::new(),
            login_id: login_id.to_string(),
            display_name: display_name.to_string(),
            role,
            password_hash: self.verifier.hash(secret),
        };
        self.identities.upsert(record.clone())?;
        tracing::info!(user_id = %record.id, login_id, role = %record.role, "user registered");
        Ok(record.identity())
    }
}

pub fn build_services(config: &AuthConfig, policy: Policy) -> AppServices {
    let identities = Arc::new(InMemoryIdentityStore::new());
    let verifier: Arc<dyn PasswordVerifier> = Arc::new(Sha256PasswordVerifier::new());
    let resolver = IdentityResolver::new(identities.clone(), config.lookup_timeout);
    let credentials = Arc::new(CredentialService::new(config, resolver, verifier.clone()));

    AppServices {
        credentials,
        authorizer: Authorizer::new(PolicyHandle::new(policy)),
        identities,
        verifier,
        notes: NoteStore::new(),
    }
}
