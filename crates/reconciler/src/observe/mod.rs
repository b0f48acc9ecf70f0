#![forbid(unsafe_code)]

mod cluster;

pub use cluster::InMemoryCluster;

use crate::domain::{WorkloadKey, WorkloadSnapshot};
use crate::error::Error;
use async_trait::async_trait;

#[async_trait]
pub trait WorkloadSource: Send + Sync {
    /// Fetch the current snapshot for a workload. `Ok(None)` means the
    /// workload was deleted between notification and fetch, which is benign;
    /// any error is retryable by the notifier.
    async fn fetch(&self, key: &WorkloadKey) -> Result<Option<WorkloadSnapshot>, Error>;
}
