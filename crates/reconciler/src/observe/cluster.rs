#![forbid(unsafe_code)]

use crate::domain::{WorkloadKey, WorkloadSnapshot};
use crate::enforcement::{Enforcer, TerminationOutcome};
use crate::error::Error;
use crate::observe::WorkloadSource;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Shared in-memory workload table. Serves as both the workload-state
/// source and the enforcement target for standalone builds and tests; a
/// terminate request simply removes the entry.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCluster {
    inner: Arc<RwLock<FxHashMap<WorkloadKey, WorkloadSnapshot>>>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, snapshot: WorkloadSnapshot) {
        self.write_lock().insert(snapshot.key.clone(), snapshot);
    }

    pub fn remove(&self, key: &WorkloadKey) -> bool {
        self.write_lock().remove(key).is_some()
    }

    pub fn contains(&self, key: &WorkloadKey) -> bool {
        self.read_lock().contains_key(key)
    }

    /// All workload keys, sorted for deterministic sweeps.
    pub fn keys(&self) -> Vec<WorkloadKey> {
        let mut keys: Vec<WorkloadKey> = self.read_lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_lock().is_empty()
    }

    fn read_lock(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, FxHashMap<WorkloadKey, WorkloadSnapshot>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, FxHashMap<WorkloadKey, WorkloadSnapshot>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl WorkloadSource for InMemoryCluster {
    async fn fetch(&self, key: &WorkloadKey) -> Result<Option<WorkloadSnapshot>, Error> {
        Ok(self.read_lock().get(key).cloned())
    }
}

#[async_trait]
impl Enforcer for InMemoryCluster {
    async fn terminate(&self, key: &WorkloadKey) -> Result<TerminationOutcome, Error> {
        if self.remove(key) {
            info!(workload = %key, "workload terminated");
            Ok(TerminationOutcome::Deleted)
        } else {
            Ok(TerminationOutcome::AlreadyGone)
        }
    }
}
