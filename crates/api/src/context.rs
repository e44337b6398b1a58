use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use gatehouse_auth::Identity;
use gatehouse_core::DomainError;

use crate::app::errors::TransportStatus;

/// Per-call state attached by the auth layer.
///
/// Holds the resolved identity (real or anonymous). Present on every request
/// that made it past the interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallState {
    identity: Identity,
}

impl CallState {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// Extractor for the caller's identity.
///
/// Rejects with `INTERNAL` if the auth layer did not run, so a missing
/// interceptor can never look like an anonymous caller.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = TransportStatus;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallState>()
            .map(|state| Caller(state.identity().clone()))
            .ok_or_else(|| DomainError::unexpected("call state missing: auth layer not installed").into())
    }
}
