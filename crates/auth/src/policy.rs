//! Authorization policy: role grants plus per-permission checker chains.
//!
//! A [`Policy`] is immutable once built. [`PolicyHandle`] publishes whole new
//! snapshots so concurrent readers never see a partial update.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

use crate::{ObjectChecker, Permission, Role};

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid policy document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable snapshot of the grant table and checker registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    grants: HashMap<Role, HashSet<Permission>>,
    checkers: HashMap<Permission, Vec<ObjectChecker>>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant permissions to a role (builder).
    pub fn grant<I>(mut self, role: Role, permissions: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        self.grants.entry(role).or_default().extend(permissions);
        self
    }

    /// Append checkers to a permission's chain (builder). Order is evaluation order.
    pub fn check<I>(mut self, permission: Permission, chain: I) -> Self
    where
        I: IntoIterator<Item = ObjectChecker>,
    {
        self.checkers.entry(permission).or_default().extend(chain);
        self
    }

    /// Whether a grant `(role, permission)` exists. Unknown roles hold nothing.
    pub fn is_granted(&self, role: &Role, permission: &Permission) -> bool {
        self.grants
            .get(role)
            .is_some_and(|perms| perms.contains(permission))
    }

    /// Registered chain for a permission; empty when none is registered.
    pub fn chain(&self, permission: &Permission) -> &[ObjectChecker] {
        self.checkers
            .get(permission)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.grants.keys()
    }

    pub fn permissions_of(&self, role: &Role) -> Vec<&Permission> {
        let mut perms: Vec<&Permission> = self
            .grants
            .get(role)
            .map(|p| p.iter().collect())
            .unwrap_or_default();
        perms.sort();
        perms
    }

    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let doc: PolicyDocument = serde_json::from_str(json)?;
        Ok(doc.into())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Stable, sorted export for audit.
    pub fn to_document(&self) -> PolicyDocument {
        PolicyDocument {
            grants: self
                .grants
                .iter()
                .map(|(role, perms)| (role.clone(), perms.iter().cloned().collect()))
                .collect(),
            checkers: self
                .checkers
                .iter()
                .map(|(perm, chain)| (perm.clone(), chain.clone()))
                .collect(),
        }
    }
}

/// Serialized policy form: `{"grants": {role: [perm]}, "checkers": {perm: [checker]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default)]
    pub grants: BTreeMap<Role, BTreeSet<Permission>>,
    #[serde(default)]
    pub checkers: BTreeMap<Permission, Vec<ObjectChecker>>,
}

impl From<PolicyDocument> for Policy {
    fn from(doc: PolicyDocument) -> Self {
        let policy = doc
            .grants
            .into_iter()
            .fold(Policy::new(), |p, (role, perms)| p.grant(role, perms));
        doc.checkers
            .into_iter()
            .fold(policy, |p, (perm, chain)| p.check(perm, chain))
    }
}

/// Shared, hot-swappable policy.
///
/// Readers take one [`Arc<Policy>`] snapshot per call; [`PolicyHandle::publish`]
/// swaps the whole snapshot at once.
#[derive(Debug, Clone)]
pub struct PolicyHandle {
    tx: Arc<watch::Sender<Arc<Policy>>>,
}

impl PolicyHandle {
    pub fn new(policy: Policy) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(policy));
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> Arc<Policy> {
        self.tx.borrow().clone()
    }

    pub fn publish(&self, policy: Policy) {
        self.tx.send_replace(Arc::new(policy));
        tracing::info!("authorization policy reloaded");
    }

    /// Receiver notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Policy>> {
        self.tx.subscribe()
    }
}
