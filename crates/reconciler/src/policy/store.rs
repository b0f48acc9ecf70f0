#![forbid(unsafe_code)]

use crate::error::Error;
use crate::policy::{Policy, PolicySpec, PolicyStatus};
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::sync::RwLock;

/// Outcome of an optimistic status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWrite {
    Applied,
    /// Another writer committed first; re-read and re-apply the delta.
    Conflict,
    /// The policy vanished; benign.
    Missing,
}

#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Current policies, sorted by name. The ordering is a contract:
    /// evaluation walks policies lexicographically, so which policy gets to
    /// terminate first is deterministic.
    async fn list(&self) -> Result<Vec<Policy>, Error>;

    async fn get(&self, name: &str) -> Result<Option<Policy>, Error>;

    /// Commit `status` iff the policy's `resource_version` still equals
    /// `expected_version`. A successful write advances the version.
    async fn update_status(
        &self,
        name: &str,
        expected_version: u64,
        status: PolicyStatus,
    ) -> Result<StatusWrite, Error>;
}

/// Versioned in-memory policy table. Spec mutation happens through
/// [`apply`](Self::apply)/[`remove`](Self::remove), standing in for the
/// external CRUD surface; status writes go through the optimistic
/// [`PolicyStore`] contract.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    inner: RwLock<FxHashMap<String, Policy>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or update a policy spec. A changed spec bumps `generation`;
    /// any committed write bumps `resource_version`. The status sub-object
    /// survives spec updates untouched.
    pub fn apply(&self, name: impl Into<String>, spec: PolicySpec) {
        let name = name.into();
        let mut inner = self.write_lock();
        match inner.get_mut(&name) {
            Some(policy) => {
                if policy.spec != spec {
                    policy.generation += 1;
                    policy.spec = spec;
                }
                policy.resource_version += 1;
            }
            None => {
                inner.insert(name.clone(), Policy::new(name, spec));
            }
        }
    }

    pub fn remove(&self, name: &str) -> bool {
        self.write_lock().remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_lock().is_empty()
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, FxHashMap<String, Policy>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, FxHashMap<String, Policy>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn list(&self) -> Result<Vec<Policy>, Error> {
        let mut policies: Vec<Policy> = self.read_lock().values().cloned().collect();
        policies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(policies)
    }

    async fn get(&self, name: &str) -> Result<Option<Policy>, Error> {
        Ok(self.read_lock().get(name).cloned())
    }

    async fn update_status(
        &self,
        name: &str,
        expected_version: u64,
        status: PolicyStatus,
    ) -> Result<StatusWrite, Error> {
        let mut inner = self.write_lock();
        let Some(policy) = inner.get_mut(name) else {
            return Ok(StatusWrite::Missing);
        };
        if policy.resource_version != expected_version {
            return Ok(StatusWrite::Conflict);
        }
        policy.status = status;
        policy.resource_version += 1;
        Ok(StatusWrite::Applied)
    }
}
