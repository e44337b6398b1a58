use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gatehouse_core::DomainError;

use crate::Role;

/// Class of a credential. Checked on every decode, independent of the signature.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl core::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TokenKind::Access => f.write_str("access"),
            TokenKind::Refresh => f.write_str("refresh"),
        }
    }
}

/// JWT claims carried by every credential.
///
/// Timestamps are Unix seconds, as registered JWT claims require.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject / user identifier.
    pub sub: String,

    /// Role at the time of issue. Informational only; authorization uses the
    /// role of the freshly resolved identity.
    pub role: Role,

    /// Token class.
    pub typ: TokenKind,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,

    /// Issuer.
    pub iss: String,

    /// Unique token id.
    pub jti: String,
}

impl TokenClaims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("expected {expected} token, got {actual}")]
    WrongKind { expected: TokenKind, actual: TokenKind },
}

impl From<TokenValidationError> for DomainError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => DomainError::credential_expired(),
            TokenValidationError::NotYetValid
            | TokenValidationError::InvalidTimeWindow
            | TokenValidationError::WrongKind { .. } => DomainError::invalid_credentials(),
        }
    }
}

/// Deterministically validate decoded claims against a point in time.
///
/// Signature verification happens before this; here the token class is
/// checked first, then the time window. A wrong-class token is rejected as
/// such even when it has also expired. `leeway` widens both ends of the window.
pub fn validate_claims(
    claims: &TokenClaims,
    expected: TokenKind,
    now: DateTime<Utc>,
    leeway: Duration,
) -> Result<(), TokenValidationError> {
    if claims.typ != expected {
        return Err(TokenValidationError::WrongKind {
            expected,
            actual: claims.typ,
        });
    }
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    let leeway = leeway.num_seconds();
    if now + leeway < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now - leeway >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
