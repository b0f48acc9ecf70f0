#![forbid(unsafe_code)]

use crate::domain::WorkloadKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Terminating,
}

impl WorkloadPhase {
    /// Terminal phases are never evaluated; the workload is already done.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether a snapshot in this phase is subject to policy evaluation.
    pub fn is_evaluable(self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub privileged: Option<bool>,
    pub run_as_user: Option<i64>,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            privileged: None,
            run_as_user: None,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged.unwrap_or(false)
    }

    pub fn runs_as_root(&self) -> bool {
        self.run_as_user == Some(0)
    }
}

/// Immutable view of one workload at notification time.
///
/// `containers` is the combined sequence of main containers followed by init
/// containers; the split does not affect evaluation, only which container
/// identity a violation reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSnapshot {
    pub key: WorkloadKey,
    pub containers: Vec<ContainerSpec>,
    pub host_network: bool,
    pub phase: WorkloadPhase,
    pub node_name: Option<String>,
}

impl WorkloadSnapshot {
    pub fn new(key: WorkloadKey, phase: WorkloadPhase) -> Self {
        Self {
            key,
            containers: Vec::new(),
            host_network: false,
            phase,
            node_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_and_running_are_evaluable() {
        assert!(WorkloadPhase::Pending.is_evaluable());
        assert!(WorkloadPhase::Running.is_evaluable());
        assert!(!WorkloadPhase::Succeeded.is_evaluable());
        assert!(!WorkloadPhase::Failed.is_evaluable());
        assert!(!WorkloadPhase::Terminating.is_evaluable());
    }

    #[test]
    fn root_detection_requires_uid_zero() {
        let mut container = ContainerSpec::new("app", "nginx");
        assert!(!container.runs_as_root());
        container.run_as_user = Some(1000);
        assert!(!container.runs_as_root());
        container.run_as_user = Some(0);
        assert!(container.runs_as_root());
    }
}
