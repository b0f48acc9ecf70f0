#![forbid(unsafe_code)]

mod ids;
mod registry;
mod violation;
mod workload;

pub use ids::WorkloadKey;
pub use registry::{DEFAULT_REGISTRY, extract_registry};
pub use violation::{EventType, ProposedAction, Severity, ViolationRecord};
pub use workload::{ContainerSpec, WorkloadPhase, WorkloadSnapshot};

/// Namespace that is never evaluated, regardless of policy scoping.
pub const RESERVED_NAMESPACE: &str = "kube-system";
