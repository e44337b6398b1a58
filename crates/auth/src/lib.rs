//! `gatehouse-auth`: authentication/authorization core.
//!
//! Credential issuance and validation, identity resolution, and role- and
//! object-level permission evaluation. Decoupled from HTTP; storage is reached
//! only through the [`IdentityStore`] trait.

pub mod authorize;
pub mod checkers;
pub mod claims;
pub mod config;
pub mod credentials;
pub mod identity;
pub mod password;
pub mod permissions;
pub mod policy;
pub mod resolver;
pub mod roles;
pub mod store;

pub use authorize::{authorize, authorize_object, AuthorizationExplanation, Authorizer, DenialKind};
pub use checkers::{ObjectChecker, Owned};
pub use claims::{TokenClaims, TokenKind, TokenValidationError, validate_claims};
pub use config::{AuthConfig, ConfigError};
pub use credentials::{CredentialService, TokenPair};
pub use identity::{Identity, IdentityRecord};
pub use password::{PasswordVerifier, Sha256PasswordVerifier};
pub use permissions::Permission;
pub use policy::{Policy, PolicyDocument, PolicyError, PolicyHandle};
pub use resolver::IdentityResolver;
pub use roles::Role;
pub use store::{IdentityStore, InMemoryIdentityStore};
