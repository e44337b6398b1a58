//! Subject id → identity resolution, bounded by a per-call deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gatehouse_core::{DomainError, DomainResult, UserId};

use crate::{Identity, IdentityRecord, IdentityStore};

/// Resolves validated subjects to identities via an [`IdentityStore`].
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
    deadline: Duration,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Load the identity for a subject id.
    ///
    /// Fails with `IdentityNotFound` when the subject no longer exists and with
    /// `UnexpectedFailure` when the lookup misses its deadline.
    pub async fn resolve(&self, subject: UserId) -> DomainResult<Identity> {
        self.bounded(self.store.get_by_id(subject))
            .await
            .map(Identity::from)
    }

    /// Load the stored record (including password hash) for a login id.
    pub(crate) async fn record_by_login_id(&self, login_id: &str) -> DomainResult<IdentityRecord> {
        self.bounded(self.store.get_by_login_id(login_id)).await
    }

    async fn bounded<T>(&self, lookup: impl Future<Output = DomainResult<T>>) -> DomainResult<T> {
        match tokio::time::timeout(self.deadline, lookup).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(deadline_ms = self.deadline.as_millis() as u64, "identity lookup timed out");
                Err(DomainError::unexpected("identity lookup timed out"))
            }
        }
    }
}

impl core::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
