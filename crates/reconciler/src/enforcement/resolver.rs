#![forbid(unsafe_code)]

use crate::domain::{EventType, ViolationRecord};
use crate::policy::Policy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementAction {
    None,
    Audit,
    Terminate,
}

/// Map a violation under a policy to the action to take. Total and pure.
///
/// Only privileged-container and disallowed-registry violations are
/// enforceable; host-network and root-user findings always audit, whatever
/// the policy mode. That asymmetry is deliberate: the latter two are
/// informational in this design.
pub fn resolve_action(policy: &Policy, violation: &ViolationRecord) -> EnforcementAction {
    if policy.is_disabled() {
        return EnforcementAction::None;
    }
    match violation.event_type {
        EventType::PrivilegedContainer | EventType::DisallowedRegistry => {
            if policy.is_enforcing() {
                EnforcementAction::Terminate
            } else {
                EnforcementAction::Audit
            }
        }
        EventType::HostNetwork | EventType::RootUser => EnforcementAction::Audit,
    }
}
