#![forbid(unsafe_code)]

mod status;
mod store;

pub use status::{Condition, ConditionStatus, PolicyPhase, PolicyStatus};
pub use store::{InMemoryPolicyStore, PolicyStore, StatusWrite};

use crate::domain::RESERVED_NAMESPACE;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnforcementMode {
    /// Violations of enforceable checks terminate the workload.
    #[default]
    Enforce,
    /// Violations are reported but nothing is terminated.
    Audit,
    /// The policy is skipped entirely.
    Disabled,
}

/// Declared rule-set of one policy. Owned by the external policy surface;
/// the reconciler only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicySpec {
    /// Whether privileged containers are violations.
    pub block_privileged: bool,

    /// Registries images may come from. Empty means unrestricted; the
    /// wildcard entry `"*"` allows everything.
    pub allowed_registries: Vec<String>,

    /// An absent mode deserializes to the default, `Enforce`.
    pub enforcement_mode: EnforcementMode,

    /// Namespaces this policy applies to. Empty means all namespaces except
    /// the reserved system namespace.
    pub target_namespaces: Vec<String>,
}

/// A named policy as held by the store: spec plus status plus the two
/// version counters. `generation` tracks spec revisions; `resource_version`
/// advances on every committed write and is the token for optimistic status
/// updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub name: String,
    pub generation: u64,
    pub resource_version: u64,
    pub spec: PolicySpec,
    pub status: PolicyStatus,
}

impl Policy {
    pub fn new(name: impl Into<String>, spec: PolicySpec) -> Self {
        Self {
            name: name.into(),
            generation: 1,
            resource_version: 1,
            spec,
            status: PolicyStatus::default(),
        }
    }

    /// Whether this policy governs workloads in `namespace`. The reserved
    /// system namespace is excluded no matter what the spec says.
    pub fn should_apply_to_namespace(&self, namespace: &str) -> bool {
        if namespace == RESERVED_NAMESPACE {
            return false;
        }
        if self.spec.target_namespaces.is_empty() {
            return true;
        }
        self.spec
            .target_namespaces
            .iter()
            .any(|ns| ns == namespace)
    }

    pub fn is_enforcing(&self) -> bool {
        self.spec.enforcement_mode == EnforcementMode::Enforce
    }

    pub fn is_auditing(&self) -> bool {
        self.spec.enforcement_mode == EnforcementMode::Audit
    }

    pub fn is_disabled(&self) -> bool {
        self.spec.enforcement_mode == EnforcementMode::Disabled
    }

    pub fn should_block_privileged(&self) -> bool {
        self.spec.block_privileged && !self.is_disabled()
    }

    /// Whether images from `registry` are acceptable under this policy.
    pub fn is_registry_allowed(&self, registry: &str) -> bool {
        if self.spec.allowed_registries.is_empty() {
            return true;
        }
        self.spec
            .allowed_registries
            .iter()
            .any(|allowed| allowed == registry || allowed == "*")
    }
}
