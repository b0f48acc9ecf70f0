//! Cluster state files: the TOML document this standalone build uses in
//! place of a live cluster watch. Policies land in the policy store,
//! workloads in the in-memory cluster.

use anyhow::Context;
use reconciler::{
    ContainerSpec, InMemoryCluster, InMemoryPolicyStore, PolicySpec, WorkloadKey, WorkloadPhase,
    WorkloadSnapshot,
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterFile {
    pub policies: Vec<PolicyEntry>,
    pub workloads: Vec<WorkloadEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyEntry {
    pub name: String,
    #[serde(default)]
    pub spec: PolicySpec,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkloadEntry {
    pub namespace: String,
    pub name: String,
    #[serde(default = "default_phase")]
    pub phase: String,
    #[serde(default)]
    pub host_network: bool,
    #[serde(default)]
    pub node_name: Option<String>,
    #[serde(default)]
    pub containers: Vec<ContainerEntry>,
    #[serde(default)]
    pub init_containers: Vec<ContainerEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContainerEntry {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub privileged: Option<bool>,
    #[serde(default)]
    pub run_as_user: Option<i64>,
}

fn default_phase() -> String {
    "Running".to_string()
}

pub fn parse_phase(phase: &str) -> Option<WorkloadPhase> {
    match phase {
        "Pending" => Some(WorkloadPhase::Pending),
        "Running" => Some(WorkloadPhase::Running),
        "Succeeded" => Some(WorkloadPhase::Succeeded),
        "Failed" => Some(WorkloadPhase::Failed),
        "Terminating" => Some(WorkloadPhase::Terminating),
        _ => None,
    }
}

pub fn load(path: impl AsRef<Path>) -> anyhow::Result<ClusterFile> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading cluster state file {}", path.display()))?;
    let file: ClusterFile = toml_edit::de::from_str(&text)
        .with_context(|| format!("parsing cluster state file {}", path.display()))?;
    Ok(file)
}

/// Apply a cluster file to the store and cluster. Returns the workload
/// keys in file order so the caller can enqueue them as notifications.
pub fn populate(
    file: ClusterFile,
    cluster: &InMemoryCluster,
    store: &InMemoryPolicyStore,
) -> anyhow::Result<Vec<WorkloadKey>> {
    for policy in file.policies {
        store.apply(policy.name, policy.spec);
    }

    let mut keys = Vec::with_capacity(file.workloads.len());
    for workload in file.workloads {
        let phase = parse_phase(&workload.phase)
            .with_context(|| format!("unknown workload phase '{}'", workload.phase))?;

        let key = WorkloadKey::new(&workload.namespace, &workload.name);
        let mut snapshot = WorkloadSnapshot::new(key.clone(), phase);
        snapshot.host_network = workload.host_network;
        snapshot.node_name = workload.node_name;
        // Main containers first, then init containers, as one sequence.
        snapshot.containers = workload
            .containers
            .into_iter()
            .chain(workload.init_containers)
            .map(|container| ContainerSpec {
                name: container.name,
                image: container.image,
                privileged: container.privileged,
                run_as_user: container.run_as_user,
            })
            .collect();

        cluster.insert(snapshot);
        keys.push(key);
    }

    Ok(keys)
}
