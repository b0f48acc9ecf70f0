#![forbid(unsafe_code)]

use async_trait::async_trait;
use config::Config;
use reconciler::{
    ContainerSpec, DefaultDetector, EnforcementMode, Error, EventSink, EventType,
    InMemoryCluster, InMemoryPolicyStore, PassOutcome, PolicySpec, PolicyStore, ProposedAction,
    Services, Severity, ShieldEngine, SystemClock, ViolationRecord, WorkloadKey, WorkloadPhase,
    WorkloadSnapshot,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct SpySink {
    emitted: Arc<Mutex<Vec<ViolationRecord>>>,
}

impl SpySink {
    fn take(emitted: &Arc<Mutex<Vec<ViolationRecord>>>) -> Vec<ViolationRecord> {
        let mut guard = emitted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *guard)
    }
}

#[async_trait]
impl EventSink for SpySink {
    async fn emit(&self, record: &ViolationRecord) -> Result<(), Error> {
        self.emitted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }
}

struct Fixture {
    cluster: InMemoryCluster,
    store: Arc<InMemoryPolicyStore>,
    engine: ShieldEngine,
    emitted: Arc<Mutex<Vec<ViolationRecord>>>,
}

fn fixture() -> Fixture {
    let cluster = InMemoryCluster::new();
    let store = Arc::new(InMemoryPolicyStore::new());
    let sink = SpySink::default();
    let emitted = sink.emitted.clone();

    let services = Services {
        source: Box::new(cluster.clone()),
        detector: Box::new(DefaultDetector),
        enforcer: Box::new(cluster.clone()),
        sink: Box::new(sink),
        clock: Box::new(SystemClock),
    };
    let engine = ShieldEngine::new(Config::default(), services, store.clone());

    Fixture {
        cluster,
        store,
        engine,
        emitted,
    }
}

fn running_workload(namespace: &str, name: &str, containers: Vec<ContainerSpec>) -> WorkloadSnapshot {
    let mut snapshot =
        WorkloadSnapshot::new(WorkloadKey::new(namespace, name), WorkloadPhase::Running);
    snapshot.containers = containers;
    snapshot
}

fn privileged_container() -> ContainerSpec {
    let mut container = ContainerSpec::new("app", "nginx");
    container.privileged = Some(true);
    container
}

// Scenario A: enforcing policy, privileged container. One CRITICAL
// violation, the workload is terminated, both counters advance.
#[tokio::test]
async fn enforcing_policy_terminates_privileged_workload() {
    let fx = fixture();
    fx.cluster
        .insert(running_workload("production", "worker", vec![privileged_container()]));
    fx.store.apply(
        "block-privileged",
        PolicySpec {
            block_privileged: true,
            enforcement_mode: EnforcementMode::Enforce,
            ..PolicySpec::default()
        },
    );

    let key = WorkloadKey::new("production", "worker");
    let report = fx.engine.reconcile(&key).await.unwrap();

    assert_eq!(report.outcome, PassOutcome::Evaluated);
    assert_eq!(report.violations, 1);
    assert!(report.terminated);
    assert!(!fx.cluster.contains(&key));

    let emitted = SpySink::take(&fx.emitted);
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].event_type, EventType::PrivilegedContainer);
    assert_eq!(emitted[0].severity, Severity::Critical);
    assert_eq!(emitted[0].proposed_action, ProposedAction::Terminate);

    let policy = fx.store.get("block-privileged").await.unwrap().unwrap();
    assert_eq!(policy.status.violations_count, 1);
    assert_eq!(policy.status.terminations_count, 1);
    assert!(policy.status.last_enforcement_time.is_some());
}

// Scenario B: same policy in audit mode. Same violation, proposed action
// Audit, nothing deleted, terminations unchanged.
#[tokio::test]
async fn auditing_policy_reports_without_terminating() {
    let fx = fixture();
    fx.cluster
        .insert(running_workload("production", "worker", vec![privileged_container()]));
    fx.store.apply(
        "block-privileged",
        PolicySpec {
            block_privileged: true,
            enforcement_mode: EnforcementMode::Audit,
            ..PolicySpec::default()
        },
    );

    let key = WorkloadKey::new("production", "worker");
    let report = fx.engine.reconcile(&key).await.unwrap();

    assert_eq!(report.violations, 1);
    assert!(!report.terminated);
    assert!(fx.cluster.contains(&key));

    let emitted = SpySink::take(&fx.emitted);
    assert_eq!(emitted[0].proposed_action, ProposedAction::Audit);

    let policy = fx.store.get("block-privileged").await.unwrap().unwrap();
    assert_eq!(policy.status.violations_count, 1);
    assert_eq!(policy.status.terminations_count, 0);
}

// Scenario C: registry allowlist, image from elsewhere.
#[tokio::test]
async fn disallowed_registry_is_flagged_high() {
    let fx = fixture();
    fx.cluster.insert(running_workload(
        "production",
        "worker",
        vec![ContainerSpec::new("app", "evil.io/malware:latest")],
    ));
    fx.store.apply(
        "trusted-registries",
        PolicySpec {
            allowed_registries: vec!["docker.io".into()],
            enforcement_mode: EnforcementMode::Audit,
            ..PolicySpec::default()
        },
    );

    let report = fx
        .engine
        .reconcile(&WorkloadKey::new("production", "worker"))
        .await
        .unwrap();
    assert_eq!(report.violations, 1);

    let emitted = SpySink::take(&fx.emitted);
    assert_eq!(emitted[0].event_type, EventType::DisallowedRegistry);
    assert_eq!(emitted[0].severity, Severity::High);
    assert_eq!(emitted[0].image.as_deref(), Some("evil.io/malware:latest"));
}

// Scenario D: host networking audits under every enforcement mode.
#[tokio::test]
async fn host_network_always_audits() {
    for mode in [EnforcementMode::Enforce, EnforcementMode::Audit] {
        let fx = fixture();
        let mut snapshot =
            running_workload("production", "worker", vec![ContainerSpec::new("app", "nginx")]);
        snapshot.host_network = true;
        fx.cluster.insert(snapshot);
        fx.store.apply(
            "baseline",
            PolicySpec {
                enforcement_mode: mode,
                ..PolicySpec::default()
            },
        );

        let key = WorkloadKey::new("production", "worker");
        let report = fx.engine.reconcile(&key).await.unwrap();

        assert_eq!(report.violations, 1);
        assert!(!report.terminated);
        assert!(fx.cluster.contains(&key));

        let emitted = SpySink::take(&fx.emitted);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].event_type, EventType::HostNetwork);
        assert_eq!(emitted[0].severity, Severity::High);
        assert_eq!(emitted[0].proposed_action, ProposedAction::Audit);
    }
}

// A disabled policy contributes nothing, whatever the workload looks like.
#[tokio::test]
async fn disabled_policy_is_skipped_entirely() {
    let fx = fixture();
    let mut snapshot = running_workload("production", "worker", vec![privileged_container()]);
    snapshot.host_network = true;
    fx.cluster.insert(snapshot);
    fx.store.apply(
        "disabled",
        PolicySpec {
            block_privileged: true,
            allowed_registries: vec!["docker.io".into()],
            enforcement_mode: EnforcementMode::Disabled,
            ..PolicySpec::default()
        },
    );

    let key = WorkloadKey::new("production", "worker");
    let report = fx.engine.reconcile(&key).await.unwrap();

    assert_eq!(report.outcome, PassOutcome::Evaluated);
    assert_eq!(report.policies_evaluated, 0);
    assert_eq!(report.violations, 0);
    assert!(fx.cluster.contains(&key));
    assert!(SpySink::take(&fx.emitted).is_empty());

    let policy = fx.store.get("disabled").await.unwrap().unwrap();
    assert_eq!(policy.status.violations_count, 0);
}

// A policy scoped to other namespaces leaves the workload alone.
#[tokio::test]
async fn out_of_scope_namespace_is_not_evaluated() {
    let fx = fixture();
    fx.cluster
        .insert(running_workload("staging", "worker", vec![privileged_container()]));
    fx.store.apply(
        "prod-only",
        PolicySpec {
            block_privileged: true,
            target_namespaces: vec!["production".into()],
            ..PolicySpec::default()
        },
    );

    let key = WorkloadKey::new("staging", "worker");
    let report = fx.engine.reconcile(&key).await.unwrap();

    assert_eq!(report.policies_evaluated, 0);
    assert!(fx.cluster.contains(&key));
}

// Re-running the same pass after a termination settles: the second pass
// sees the workload gone and changes nothing.
#[tokio::test]
async fn second_pass_after_termination_is_a_noop() {
    let fx = fixture();
    fx.cluster
        .insert(running_workload("production", "worker", vec![privileged_container()]));
    fx.store.apply(
        "block-privileged",
        PolicySpec {
            block_privileged: true,
            ..PolicySpec::default()
        },
    );

    let key = WorkloadKey::new("production", "worker");
    fx.engine.reconcile(&key).await.unwrap();
    let second = fx.engine.reconcile(&key).await.unwrap();

    assert_eq!(second.outcome, PassOutcome::WorkloadGone);
    let policy = fx.store.get("block-privileged").await.unwrap().unwrap();
    assert_eq!(policy.status.violations_count, 1);
    assert_eq!(policy.status.terminations_count, 1);
}
