use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Audit {
    /// Base URL of the audit service that receives violation events, for
    /// example `http://audit-service:8000`. Events are POSTed to the `/log`
    /// endpoint under this base. An empty string disables event emission
    /// entirely; violations are still detected and enforced, they are just
    /// not reported anywhere.
    pub sink_url: String,

    /// Per-request timeout for event delivery. **Measured in seconds**.
    ///
    /// # Note
    ///
    /// Emission is best effort. A delivery that exceeds this timeout is
    /// dropped and logged; it never delays or aborts a reconciliation pass.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub timeout: Duration,
}

impl Default for Audit {
    fn default() -> Self {
        Self {
            sink_url: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Audit {
    /// Whether a sink URL is configured at all.
    pub fn emission_enabled(&self) -> bool {
        !self.sink_url.is_empty()
    }
}
