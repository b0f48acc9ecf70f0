#![forbid(unsafe_code)]

use crate::domain::WorkloadKey;
use crate::error::Error;
use async_trait::async_trait;
use tracing::debug;

/// Both outcomes are success: deletion is idempotent, a workload that is
/// already gone needs no further enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    Deleted,
    AlreadyGone,
}

#[async_trait]
pub trait Enforcer: Send + Sync {
    /// Request removal of the workload.
    async fn terminate(&self, key: &WorkloadKey) -> Result<TerminationOutcome, Error>;
}

/// Logs the request and deletes nothing. Used for dry runs and for builds
/// without an enforcement target.
#[derive(Debug, Default)]
pub struct NoopEnforcer;

#[async_trait]
impl Enforcer for NoopEnforcer {
    async fn terminate(&self, key: &WorkloadKey) -> Result<TerminationOutcome, Error> {
        debug!(workload = %key, "dry-run termination");
        Ok(TerminationOutcome::Deleted)
    }
}
