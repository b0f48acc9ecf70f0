#![forbid(unsafe_code)]

use crate::domain::WorkloadKey;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to fetch workload {key}: {reason}")]
    WorkloadFetch { key: WorkloadKey, reason: String },

    #[error("Failed to list policies: {0}")]
    PolicyList(String),

    #[error("Status update for policy '{policy}' still conflicted after {attempts} attempts")]
    StatusConflict { policy: String, attempts: u32 },

    #[error("Failed to terminate workload {key}: {reason}")]
    Termination { key: WorkloadKey, reason: String },

    #[error("Event emission failed: {0}")]
    Emission(String),
}
