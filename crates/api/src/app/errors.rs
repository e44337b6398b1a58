//! Domain error → transport status translation.
//!
//! Every response that leaves the process on a failure path is a
//! [`TransportStatus`]. The mapping from [`ErrorCode`] is total and fixed;
//! anything that is not a [`DomainError`] is reported as `INTERNAL` with a
//! generic message.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gatehouse_core::{DomainError, ErrorCode};

const INTERNAL_MESSAGE: &str = "internal error";

/// Transport-level status code (RPC style).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    InvalidArgument,
    NotFound,
    PermissionDenied,
    Unauthenticated,
    Internal,
}

impl Code {
    pub fn http_status(self) -> StatusCode {
        match self {
            Code::InvalidArgument => StatusCode::BAD_REQUEST,
            Code::NotFound => StatusCode::NOT_FOUND,
            Code::PermissionDenied => StatusCode::FORBIDDEN,
            Code::Unauthenticated => StatusCode::UNAUTHORIZED,
            Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The one transport code for each domain code.
pub fn code_for(code: ErrorCode) -> Code {
    match code {
        ErrorCode::InvalidCredentials
        | ErrorCode::CredentialExpired
        | ErrorCode::IdentityNotFound
        | ErrorCode::Unauthenticated => Code::Unauthenticated,
        ErrorCode::PermissionDenied => Code::PermissionDenied,
        ErrorCode::ValidationFailed => Code::InvalidArgument,
        ErrorCode::ResourceNotFound => Code::NotFound,
        ErrorCode::UnexpectedFailure => Code::Internal,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub description: String,
}

/// One key/value parameter of an [`StatusDetail::ErrorInfo`].
///
/// Kept as an ordered list: a key may repeat when an error was enriched more
/// than once on its way out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// Machine-readable detail attached to a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusDetail {
    /// Validation failures, one entry per offending field.
    BadRequest { field_violations: Vec<FieldViolation> },
    /// Every other domain error: its code and key/value parameters.
    ErrorInfo {
        reason: ErrorCode,
        domain_code: u16,
        metadata: Vec<MetadataEntry>,
    },
}

/// Structured error returned at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportStatus {
    pub code: Code,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<StatusDetail>,
}

impl TransportStatus {
    /// Status for an error that is not a [`DomainError`]. Fails closed.
    ///
    /// The error text is logged, never returned.
    pub fn unrecognized(err: &(dyn std::error::Error + 'static)) -> Self {
        tracing::error!(error = %err, "unrecognized error at transport boundary");
        Self {
            code: Code::Internal,
            message: INTERNAL_MESSAGE.to_string(),
            details: Vec::new(),
        }
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

/// Translate a domain error. Deterministic: the result depends only on `err`.
pub fn to_transport_status(err: &DomainError) -> TransportStatus {
    let code = code_for(err.code());

    let detail = match err.code() {
        ErrorCode::ValidationFailed => StatusDetail::BadRequest {
            field_violations: err
                .params()
                .iter()
                .map(|(field, description)| FieldViolation {
                    field: field.clone(),
                    description: description.clone(),
                })
                .collect(),
        },
        other => StatusDetail::ErrorInfo {
            reason: other,
            domain_code: other.as_u16(),
            metadata: err
                .params()
                .iter()
                .map(|(key, value)| MetadataEntry {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        },
    };

    let message = if code == Code::Internal {
        tracing::error!(error = %err, "unexpected failure at transport boundary");
        INTERNAL_MESSAGE.to_string()
    } else {
        err.message().to_string()
    };

    TransportStatus {
        code,
        message,
        details: vec![detail],
    }
}

impl From<DomainError> for TransportStatus {
    fn from(err: DomainError) -> Self {
        to_transport_status(&err)
    }
}

impl From<anyhow::Error> for TransportStatus {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(domain) => to_transport_status(domain),
            None => Self::unrecognized(&*err),
        }
    }
}

impl IntoResponse for TransportStatus {
    fn into_response(self) -> axum::response::Response {
        (self.http_status(), axum::Json(self)).into_response()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatusDecodeError {
    #[error("status carries no detail")]
    MissingDetail,

    #[error("unknown domain code {0}")]
    UnknownCode(u16),
}

/// Rebuild a domain error from its transport form (client side / audit).
impl TryFrom<&TransportStatus> for DomainError {
    type Error = StatusDecodeError;

    fn try_from(status: &TransportStatus) -> Result<Self, Self::Error> {
        match status.details.first() {
            Some(StatusDetail::BadRequest { field_violations }) => Ok(field_violations.iter().fold(
                DomainError::new(ErrorCode::ValidationFailed, status.message.clone()),
                |err, v| err.with_violation(v.field.clone(), v.description.clone()),
            )),
            Some(StatusDetail::ErrorInfo {
                domain_code, metadata, ..
            }) => {
                let code = ErrorCode::try_from(*domain_code)
                    .map_err(|_| StatusDecodeError::UnknownCode(*domain_code))?;
                Ok(metadata.iter().fold(
                    DomainError::new(code, status.message.clone()),
                    |err, entry| err.with_param(entry.key.clone(), entry.value.clone()),
                ))
            }
            None => Err(StatusDecodeError::MissingDetail),
        }
    }
}
