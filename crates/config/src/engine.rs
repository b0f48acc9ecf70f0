use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Engine {
    /// How often policy statuses are refreshed even without workload churn.
    /// Every interval the engine walks the policy list, initializes missing
    /// statuses and records spec-generation changes. **Measured in
    /// seconds**.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub resync_interval: Duration,

    /// Maximum number of attempts for an optimistic policy status write.
    ///
    /// # Note
    ///
    /// Concurrent passes over different workloads may race on the same
    /// policy's counters. A conflicting write re-reads the policy and
    /// re-applies its delta; only after this many failed attempts does the
    /// pass surface a retryable error.
    pub status_retry_limit: u32,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            resync_interval: Duration::from_secs(30),
            status_retry_limit: 5,
        }
    }
}
