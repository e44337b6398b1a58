//! Identity lookup collaborator.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use gatehouse_core::{DomainError, DomainResult, UserId};

use crate::IdentityRecord;

/// Identity lookup, implemented by whatever user storage the deployment uses.
///
/// Both lookups fail with `IdentityNotFound` on a miss. Implementations are
/// responsible for their own concurrency safety.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn get_by_login_id(&self, login_id: &str) -> DomainResult<IdentityRecord>;
    async fn get_by_id(&self, id: UserId) -> DomainResult<IdentityRecord>;
}

#[async_trait]
impl<S> IdentityStore for Arc<S>
where
    S: IdentityStore + ?Sized,
{
    async fn get_by_login_id(&self, login_id: &str) -> DomainResult<IdentityRecord> {
        (**self).get_by_login_id(login_id).await
    }

    async fn get_by_id(&self, id: UserId) -> DomainResult<IdentityRecord> {
        (**self).get_by_id(id).await
    }
}

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<UserId, IdentityRecord>,
    by_login: HashMap<String, UserId>,
}

/// In-memory identity store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    inner: RwLock<Records>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record. Login ids are unique.
    pub fn upsert(&self, record: IdentityRecord) -> DomainResult<()> {
        let mut records = self
            .inner
            .write()
            .map_err(|_| DomainError::unexpected("identity store poisoned"))?;

        if let Some(existing) = records.by_login.get(&record.login_id) {
            if *existing != record.id {
                return Err(DomainError::validation("login_id", "login id already taken"));
            }
        }
        if let Some(previous) = records.by_id.get(&record.id) {
            let stale = previous.login_id.clone();
            records.by_login.remove(&stale);
        }

        records.by_login.insert(record.login_id.clone(), record.id);
        records.by_id.insert(record.id, record);
        Ok(())
    }

    pub fn remove(&self, id: UserId) -> DomainResult<()> {
        let mut records = self
            .inner
            .write()
            .map_err(|_| DomainError::unexpected("identity store poisoned"))?;

        if let Some(record) = records.by_id.remove(&id) {
            records.by_login.remove(&record.login_id);
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn get_by_login_id(&self, login_id: &str) -> DomainResult<IdentityRecord> {
        let records = self
            .inner
            .read()
            .map_err(|_| DomainError::unexpected("identity store poisoned"))?;

        records
            .by_login
            .get(login_id)
            .and_then(|id| records.by_id.get(id))
            .cloned()
            .ok_or_else(|| DomainError::identity_not_found(login_id))
    }

    async fn get_by_id(&self, id: UserId) -> DomainResult<IdentityRecord> {
        let records = self
            .inner
            .read()
            .map_err(|_| DomainError::unexpected("identity store poisoned"))?;

        records
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::identity_not_found(id.to_string()))
    }
}
