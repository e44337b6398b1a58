//! Domain error model.
//!
//! Every failure that can leave the auth core is a [`DomainError`]: a code from
//! the fixed [`ErrorCode`] taxonomy, a human message, and an ordered list of
//! key/value parameters. Transport layers translate these; they never invent
//! their own kinds.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Fixed error taxonomy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u16)]
pub enum ErrorCode {
    /// Credential is forged, malformed, of the wrong class, or the login secret is wrong.
    InvalidCredentials = 1001,
    /// Credential was valid but its lifetime has elapsed.
    CredentialExpired = 1002,
    /// Credential was valid but its subject no longer exists.
    IdentityNotFound = 1003,
    /// Caller could not be identified.
    Unauthenticated = 1004,
    /// Caller is known but not allowed.
    PermissionDenied = 1005,
    /// Field-level input validation failed.
    ValidationFailed = 2001,
    /// A requested resource does not exist.
    ResourceNotFound = 2002,
    /// Catch-all; always treated as a server-side failure.
    UnexpectedFailure = 9000,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 8] = [
        ErrorCode::InvalidCredentials,
        ErrorCode::CredentialExpired,
        ErrorCode::IdentityNotFound,
        ErrorCode::Unauthenticated,
        ErrorCode::PermissionDenied,
        ErrorCode::ValidationFailed,
        ErrorCode::ResourceNotFound,
        ErrorCode::UnexpectedFailure,
    ];

    /// Numeric code as carried on the wire.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::CredentialExpired => "CREDENTIAL_EXPIRED",
            ErrorCode::IdentityNotFound => "IDENTITY_NOT_FOUND",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::UnexpectedFailure => "UNEXPECTED_FAILURE",
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::unexpected("unknown error code").with_param("code", s))
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = DomainError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ErrorCode::ALL
            .into_iter()
            .find(|c| c.as_u16() == value)
            .ok_or_else(|| {
                DomainError::unexpected("unknown error code").with_param("code", value.to_string())
            })
    }
}

/// Domain-level error.
///
/// Constructed at the point of failure and enriched with [`DomainError::with_param`]
/// while it propagates. The code is never changed after construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DomainError {
    code: ErrorCode,
    message: String,
    params: Vec<(String, String)>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            params: Vec::new(),
        }
    }

    /// Wrong secret, unknown login, forged or wrong-class token.
    ///
    /// The message is fixed so callers cannot tell the causes apart.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "invalid credentials")
    }

    pub fn credential_expired() -> Self {
        Self::new(ErrorCode::CredentialExpired, "credential expired")
    }

    pub fn identity_not_found(subject: impl Into<String>) -> Self {
        Self::new(ErrorCode::IdentityNotFound, "identity not found").with_param("subject", subject)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, message)
    }

    pub fn permission_denied(permission: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, "permission denied").with_param("permission", permission)
    }

    /// Validation failure for a single field. Chain [`DomainError::with_violation`] for more.
    pub fn validation(field: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, "validation failed").with_param(field, description)
    }

    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        let kind = kind.into();
        Self::new(ErrorCode::ResourceNotFound, format!("{kind} not found"))
            .with_param("kind", kind)
            .with_param("id", id)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnexpectedFailure, message)
    }

    /// Append a context parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Append a field violation (alias of [`DomainError::with_param`] for validation errors).
    pub fn with_violation(self, field: impl Into<String>, description: impl Into<String>) -> Self {
        self.with_param(field, description)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }
}
