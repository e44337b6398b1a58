//! Auth interceptor: establishes *who* is calling, never *what they may do*.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use gatehouse_auth::{CredentialService, Identity};
use gatehouse_core::{DomainError, DomainResult, ErrorCode};

use crate::app::errors::TransportStatus;
use crate::context::CallState;

#[derive(Clone)]
pub struct AuthState {
    pub credentials: Arc<CredentialService>,
}

/// What the `Authorization` header says about the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bearer<'a> {
    /// No header, or a scheme other than bearer: proceed anonymously.
    Absent,
    /// Bearer scheme with an unusable token: reject.
    Malformed,
    Token(&'a str),
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let identity = match authenticate(&state, req.headers()).await {
        Ok(identity) => identity,
        Err(e) => return TransportStatus::from(e).into_response(),
    };

    req.extensions_mut().insert(CallState::new(identity));
    next.run(req).await
}

/// Resolve the caller from request headers.
///
/// Credential and identity failures become `Unauthenticated`; lookup timeouts
/// and other internal failures pass through unchanged.
pub async fn authenticate(state: &AuthState, headers: &HeaderMap) -> DomainResult<Identity> {
    let token = match extract_bearer(headers) {
        Bearer::Absent => {
            tracing::debug!("anonymous call");
            return Ok(Identity::anonymous());
        }
        Bearer::Malformed => {
            tracing::warn!("rejected call: malformed bearer credential");
            return Err(DomainError::unauthenticated("malformed bearer credential"));
        }
        Bearer::Token(token) => token,
    };

    let subject = state.credentials.subject(token).map_err(|e| {
        tracing::warn!(cause = %e.code(), "rejected call: invalid credential");
        DomainError::unauthenticated("invalid credential").with_param("cause", e.code().as_str())
    })?;

    match state.credentials.resolver().resolve(subject).await {
        Ok(identity) => {
            tracing::debug!(user_id = %subject, role = %identity.role, "authenticated call");
            Ok(identity)
        }
        Err(e) if e.is(ErrorCode::IdentityNotFound) => {
            tracing::warn!(user_id = %subject, "rejected call: subject no longer exists");
            Err(DomainError::unauthenticated("invalid credential").with_param("cause", e.code().as_str()))
        }
        Err(e) => Err(e),
    }
}

pub fn extract_bearer(headers: &HeaderMap) -> Bearer<'_> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Bearer::Absent;
    };
    // Present but unreadable is not the same as absent.
    match header.to_str() {
        Ok(value) => parse_bearer(value),
        Err(_) => Bearer::Malformed,
    }
}

/// Split `"<scheme> <token>"`. The scheme match is case-insensitive and any
/// run of whitespace separates it from the token.
pub fn parse_bearer(value: &str) -> Bearer<'_> {
    let value = value.trim();
    let (scheme, token) = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) => (scheme, rest.trim()),
        None => (value, ""),
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Bearer::Absent;
    }
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Bearer::Malformed;
    }
    Bearer::Token(token)
}
