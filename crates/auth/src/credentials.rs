//! Credential (token pair) issuance, validation and refresh.
//!
//! Tokens are HS256 JWTs. Decoding checks, in order: signature and issuer,
//! then the token class, then the validity window. A refresh token is never
//! accepted where an access token is expected, and vice versa.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatehouse_core::{DomainError, DomainResult, ErrorCode, UserId};

use crate::claims::{TokenClaims, TokenKind, validate_claims};
use crate::{AuthConfig, Identity, IdentityResolver, PasswordVerifier, Role};

/// Access + refresh credential, as returned on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and checks credentials.
///
/// Validation is a pure function of the secret, the token and the clock; only
/// [`CredentialService::issue_for_credentials`] touches the identity store.
pub struct CredentialService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    leeway: Duration,
    resolver: IdentityResolver,
    verifier: Arc<dyn PasswordVerifier>,
    dummy_hash: String,
}

impl CredentialService {
    pub fn new(config: &AuthConfig, resolver: IdentityResolver, verifier: Arc<dyn PasswordVerifier>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time window is checked by `validate_claims` so expiry maps to its own kind.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[config.issuer.as_str()]);

        // Verified against on unknown logins so both failure paths do the same work.
        let dummy_hash = verifier.hash(&Uuid::new_v4().to_string());

        Self {
            encoding: EncodingKey::from_secret(&config.secret),
            decoding: DecodingKey::from_secret(&config.secret),
            validation,
            issuer: config.issuer.clone(),
            access_ttl: to_chrono(config.access_ttl),
            refresh_ttl: to_chrono(config.refresh_ttl),
            leeway: to_chrono(config.leeway),
            resolver,
            verifier,
            dummy_hash,
        }
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Mint a fresh pair for an already-resolved identity.
    pub fn issue_for_identity(&self, identity: &Identity) -> DomainResult<TokenPair> {
        self.issue_for_identity_at(identity, Utc::now())
    }

    pub fn issue_for_identity_at(&self, identity: &Identity, now: DateTime<Utc>) -> DomainResult<TokenPair> {
        let Some(id) = identity.id else {
            return Err(DomainError::unexpected("cannot issue credentials for the anonymous identity"));
        };
        self.issue(id, &identity.role, now)
    }

    /// Log in with a login id and secret.
    ///
    /// Unknown login and wrong secret fail identically with `InvalidCredentials`.
    pub async fn issue_for_credentials(&self, login_id: &str, secret: &str) -> DomainResult<TokenPair> {
        let record = match self.resolver.record_by_login_id(login_id).await {
            Ok(record) => record,
            Err(e) if e.is(ErrorCode::IdentityNotFound) => {
                let _ = self.verifier.verify(secret, &self.dummy_hash);
                tracing::debug!("login rejected");
                return Err(DomainError::invalid_credentials());
            }
            Err(e) => return Err(e),
        };

        if !self.verifier.verify(secret, &record.password_hash) {
            tracing::debug!("login rejected");
            return Err(DomainError::invalid_credentials());
        }

        tracing::info!(user_id = %record.id, "login succeeded");
        self.issue(record.id, &record.role, Utc::now())
    }

    /// Exchange a refresh token for a new pair. Never re-checks the password.
    pub fn refresh(&self, refresh_token: &str) -> DomainResult<TokenPair> {
        self.refresh_at(refresh_token, Utc::now())
    }

    pub fn refresh_at(&self, refresh_token: &str, now: DateTime<Utc>) -> DomainResult<TokenPair> {
        let claims = self.decode(refresh_token, TokenKind::Refresh, now)?;
        let subject = parse_subject(&claims)?;
        self.issue(subject, &claims.role, now)
    }

    /// Signature, expiry and access-class check. No identity lookup.
    pub fn validate(&self, access_token: &str) -> DomainResult<()> {
        self.validate_at(access_token, Utc::now())
    }

    pub fn validate_at(&self, access_token: &str, now: DateTime<Utc>) -> DomainResult<()> {
        self.decode(access_token, TokenKind::Access, now).map(|_| ())
    }

    /// Subject id of a valid access token.
    pub fn subject(&self, access_token: &str) -> DomainResult<UserId> {
        self.subject_at(access_token, Utc::now())
    }

    pub fn subject_at(&self, access_token: &str, now: DateTime<Utc>) -> DomainResult<UserId> {
        let claims = self.decode(access_token, TokenKind::Access, now)?;
        parse_subject(&claims)
    }

    /// Decode and fully check a token of the expected class.
    pub fn decode(&self, token: &str, expected: TokenKind, now: DateTime<Utc>) -> DomainResult<TokenClaims> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "credential rejected");
                DomainError::invalid_credentials()
            })?;

        validate_claims(&data.claims, expected, now, self.leeway)?;
        Ok(data.claims)
    }

    fn issue(&self, subject: UserId, role: &Role, now: DateTime<Utc>) -> DomainResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign(subject, role, TokenKind::Access, now)?,
            refresh_token: self.sign(subject, role, TokenKind::Refresh, now)?,
        })
    }

    fn sign(&self, subject: UserId, role: &Role, typ: TokenKind, now: DateTime<Utc>) -> DomainResult<String> {
        let ttl = match typ {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| DomainError::unexpected("token expiry out of range"))?;
        let claims = TokenClaims {
            sub: subject.to_string(),
            role: role.clone(),
            typ,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::unexpected(format!("token signing failed: {e}")))
    }
}

impl core::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialService")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

fn parse_subject(claims: &TokenClaims) -> DomainResult<UserId> {
    claims
        .sub
        .parse::<UserId>()
        .map_err(|_| DomainError::invalid_credentials())
}

fn to_chrono(d: std::time::Duration) -> Duration {
    Duration::from_std(d).unwrap_or_else(|_| Duration::days(36_500))
}
