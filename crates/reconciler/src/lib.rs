#![forbid(unsafe_code)]

pub mod clock;
pub mod detection;
pub mod domain;
pub mod emission;
pub mod enforcement;
pub mod engine;
pub mod error;
pub mod observe;
pub mod policy;
pub mod status;

pub use engine::{ControlEvent, PassOutcome, PassReport, ReloadBundle, Services, ShieldEngine};

pub use detection::{DefaultDetector, ViolationDetector};
pub use emission::{EventSink, HttpEventSink, NoopSink, SecurityEvent};
pub use enforcement::{
    EnforcementAction, Enforcer, NoopEnforcer, TerminationOutcome, resolve_action,
};
pub use observe::{InMemoryCluster, WorkloadSource};
pub use policy::{
    Condition, ConditionStatus, EnforcementMode, InMemoryPolicyStore, Policy, PolicyPhase,
    PolicySpec, PolicyStatus, PolicyStore, StatusWrite,
};
pub use status::{StatusAggregator, apply_pass};

pub use clock::{Clock, SystemClock};
pub use domain::{
    ContainerSpec, DEFAULT_REGISTRY, EventType, ProposedAction, RESERVED_NAMESPACE, Severity,
    ViolationRecord, WorkloadKey, WorkloadPhase, WorkloadSnapshot, extract_registry,
};
pub use error::Error;
