#![forbid(unsafe_code)]

use crate::domain::WorkloadKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    HostNetwork,
    PrivilegedContainer,
    DisallowedRegistry,
    RootUser,
}

impl EventType {
    /// Severity is fixed per event type.
    pub fn severity(self) -> Severity {
        match self {
            Self::PrivilegedContainer => Severity::Critical,
            Self::HostNetwork | Self::DisallowedRegistry | Self::RootUser => Severity::High,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostNetwork => "HOST_NETWORK",
            Self::PrivilegedContainer => "PRIVILEGED_CONTAINER",
            Self::DisallowedRegistry => "DISALLOWED_REGISTRY",
            Self::RootUser => "ROOT_USER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Action stamped on a record before emission. Informational event types are
/// always `Audit`; the resolver upgrades the enforceable ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposedAction {
    Audit,
    Terminate,
}

impl ProposedAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audit => "AUDIT",
            Self::Terminate => "TERMINATED",
        }
    }
}

/// One detected mismatch between a workload and a policy. Immutable once
/// built, except for `proposed_action`, which the action resolver stamps
/// before the record is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationRecord {
    pub event_type: EventType,
    pub severity: Severity,
    pub subject: WorkloadKey,
    pub container: Option<String>,
    pub image: Option<String>,
    /// Machine-oriented summary.
    pub reason: String,
    /// Human-oriented explanation.
    pub description: String,
    pub policy_name: String,
    pub node_name: Option<String>,
    pub proposed_action: ProposedAction,
}

impl ViolationRecord {
    pub fn new(event_type: EventType, subject: WorkloadKey, policy_name: impl Into<String>) -> Self {
        Self {
            event_type,
            severity: event_type.severity(),
            subject,
            container: None,
            image: None,
            reason: String::new(),
            description: String::new(),
            policy_name: policy_name.into(),
            node_name: None,
            proposed_action: ProposedAction::Audit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_fixed_per_event_type() {
        assert_eq!(EventType::PrivilegedContainer.severity(), Severity::Critical);
        assert_eq!(EventType::HostNetwork.severity(), Severity::High);
        assert_eq!(EventType::DisallowedRegistry.severity(), Severity::High);
        assert_eq!(EventType::RootUser.severity(), Severity::High);
    }

    #[test]
    fn severity_ordering_puts_critical_on_top() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }
}
