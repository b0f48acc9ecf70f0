#![forbid(unsafe_code)]

use crate::domain::{EventType, ViolationRecord, WorkloadSnapshot, extract_registry};
use crate::policy::Policy;

/// Deterministic, side-effect-free scan of one snapshot against one policy.
/// Re-running detection on the same inputs yields the same sequence.
pub trait ViolationDetector: Send + Sync {
    fn detect(&self, snapshot: &WorkloadSnapshot, policy: &Policy) -> Vec<ViolationRecord>;
}

/// Check order is fixed: the workload-level host-network check once, then
/// per container: privileged, registry, run-as-root.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDetector;

impl ViolationDetector for DefaultDetector {
    fn detect(&self, snapshot: &WorkloadSnapshot, policy: &Policy) -> Vec<ViolationRecord> {
        if policy.is_disabled() {
            return Vec::new();
        }

        let mut violations = Vec::new();

        if snapshot.host_network {
            let mut record =
                ViolationRecord::new(EventType::HostNetwork, snapshot.key.clone(), &policy.name);
            record.reason = "Workload using host network".into();
            record.description = format!(
                "Workload '{}' is using host network which can bypass network policies",
                snapshot.key.name()
            );
            record.node_name = snapshot.node_name.clone();
            violations.push(record);
        }

        for container in &snapshot.containers {
            if policy.should_block_privileged() && container.is_privileged() {
                let mut record = ViolationRecord::new(
                    EventType::PrivilegedContainer,
                    snapshot.key.clone(),
                    &policy.name,
                );
                record.container = Some(container.name.clone());
                record.image = Some(container.image.clone());
                record.reason = "Privileged container detected".into();
                record.description = format!(
                    "Container '{}' is running in privileged mode which violates policy '{}'",
                    container.name, policy.name
                );
                record.node_name = snapshot.node_name.clone();
                violations.push(record);
            }

            if !policy.spec.allowed_registries.is_empty() {
                let registry = extract_registry(&container.image);
                if !policy.is_registry_allowed(registry) {
                    let mut record = ViolationRecord::new(
                        EventType::DisallowedRegistry,
                        snapshot.key.clone(),
                        &policy.name,
                    );
                    record.container = Some(container.name.clone());
                    record.image = Some(container.image.clone());
                    record.reason = format!("Image from disallowed registry: {registry}");
                    record.description = format!(
                        "Container '{}' uses image from registry '{}' which is not in the allowed list",
                        container.name, registry
                    );
                    record.node_name = snapshot.node_name.clone();
                    violations.push(record);
                }
            }

            if container.runs_as_root() {
                let mut record = ViolationRecord::new(
                    EventType::RootUser,
                    snapshot.key.clone(),
                    &policy.name,
                );
                record.container = Some(container.name.clone());
                record.image = Some(container.image.clone());
                record.reason = "Container running as root user".into();
                record.description = format!(
                    "Container '{}' is configured to run as root (UID 0)",
                    container.name
                );
                record.node_name = snapshot.node_name.clone();
                violations.push(record);
            }
        }

        violations
    }
}
