#![forbid(unsafe_code)]

use crate::clock::Clock;
use crate::detection::ViolationDetector;
use crate::domain::{ProposedAction, RESERVED_NAMESPACE, WorkloadKey};
use crate::emission::EventSink;
use crate::enforcement::{EnforcementAction, Enforcer, resolve_action};
use crate::error::Error;
use crate::observe::WorkloadSource;
use crate::policy::PolicyStore;
use crate::status::StatusAggregator;
use config::Config;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct Services {
    pub source: Box<dyn WorkloadSource + Send + Sync>,
    pub detector: Box<dyn ViolationDetector + Send + Sync>,
    pub enforcer: Box<dyn Enforcer + Send + Sync>,
    pub sink: Box<dyn EventSink + Send + Sync>,
    pub clock: Box<dyn Clock + Send + Sync>,
}

pub struct ReloadBundle {
    pub config: Config,
    pub detector: Box<dyn ViolationDetector + Send + Sync>,
    pub enforcer: Box<dyn Enforcer + Send + Sync>,
    pub sink: Box<dyn EventSink + Send + Sync>,
}

pub enum ControlEvent {
    Reload(Box<ReloadBundle>),
    DumpStatus,
    ResyncNow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The workload was checked against the applicable policies.
    Evaluated,
    /// Reserved system namespace; never evaluated.
    ReservedNamespace,
    /// Deleted between notification and fetch; benign.
    WorkloadGone,
    /// Terminal or terminating phase; nothing to evaluate.
    NotEvaluable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub pass_id: u64,
    pub outcome: PassOutcome,
    pub policies_evaluated: usize,
    pub violations: usize,
    pub terminated: bool,
}

impl PassReport {
    fn skipped(pass_id: u64, outcome: PassOutcome) -> Self {
        Self {
            pass_id,
            outcome,
            policies_evaluated: 0,
            violations: 0,
            terminated: false,
        }
    }
}

pub struct ShieldEngine {
    config: Config,
    services: Services,
    policies: Arc<dyn PolicyStore>,
    aggregator: StatusAggregator,
    passes: AtomicU64,
}

impl ShieldEngine {
    pub fn new(config: Config, services: Services, policies: Arc<dyn PolicyStore>) -> Self {
        let aggregator =
            StatusAggregator::new(policies.clone(), config.engine.status_retry_limit);
        Self {
            config,
            services,
            policies,
            aggregator,
            passes: AtomicU64::new(0),
        }
    }

    /// Evaluate one workload against every applicable policy.
    ///
    /// Policies are walked in the store's lexicographic order. Per
    /// violation, in detection order: resolve the action, stamp it on the
    /// record, emit best-effort, and on `Terminate` request deletion and
    /// stop. The first enforced termination ends the pass, so at most one
    /// termination request is issued per pass. Each policy that produced
    /// violations gets exactly one status update.
    pub async fn reconcile(&self, key: &WorkloadKey) -> Result<PassReport, Error> {
        let pass_id = self.passes.fetch_add(1, Ordering::Relaxed) + 1;

        if key.namespace() == RESERVED_NAMESPACE {
            return Ok(PassReport::skipped(pass_id, PassOutcome::ReservedNamespace));
        }

        let Some(snapshot) = self.services.source.fetch(key).await? else {
            debug!(workload = %key, "workload gone before evaluation");
            return Ok(PassReport::skipped(pass_id, PassOutcome::WorkloadGone));
        };

        if !snapshot.phase.is_evaluable() {
            return Ok(PassReport::skipped(pass_id, PassOutcome::NotEvaluable));
        }

        let policies = self.policies.list().await?;
        let now = self.services.clock.now_utc();

        let mut report = PassReport {
            pass_id,
            outcome: PassOutcome::Evaluated,
            policies_evaluated: 0,
            violations: 0,
            terminated: false,
        };

        for policy in &policies {
            if policy.is_disabled() || !policy.should_apply_to_namespace(key.namespace()) {
                continue;
            }
            report.policies_evaluated += 1;

            let violations = self.services.detector.detect(&snapshot, policy);
            if violations.is_empty() {
                continue;
            }

            let mut terminated = false;
            for mut violation in violations {
                let action = resolve_action(policy, &violation);
                violation.proposed_action = match action {
                    EnforcementAction::Terminate => ProposedAction::Terminate,
                    EnforcementAction::Audit => ProposedAction::Audit,
                    EnforcementAction::None => continue,
                };
                report.violations += 1;

                if let Err(err) = self.services.sink.emit(&violation).await {
                    warn!(workload = %key, policy = %policy.name, %err, "event emission failed");
                }

                if action == EnforcementAction::Terminate {
                    info!(
                        workload = %key,
                        policy = %policy.name,
                        reason = %violation.reason,
                        "terminating workload due to policy violation"
                    );
                    let outcome = self.services.enforcer.terminate(key).await?;
                    debug!(workload = %key, ?outcome, "termination requested");
                    terminated = true;
                    break;
                }
            }

            self.aggregator
                .record_pass(&policy.name, terminated, now)
                .await?;

            if terminated {
                report.terminated = true;
                break;
            }
        }

        Ok(report)
    }

    /// Refresh every policy's status: initialize missing ones and record
    /// spec-generation changes. Driven periodically by [`run_until`].
    ///
    /// [`run_until`]: Self::run_until
    pub async fn resync_policies(&self) -> Result<(), Error> {
        let policies = self.policies.list().await?;
        let now = self.services.clock.now_utc();
        for policy in &policies {
            self.aggregator.observe_generation(&policy.name, now).await?;
        }
        Ok(())
    }

    /// Drive reconciliation until the cancellation token fires. Workload
    /// notifications arrive on `work_rx`; passes run one at a time, and any
    /// concurrent dispatch across workloads belongs to the caller. A failed
    /// pass is logged and left to the notifier's backoff.
    pub async fn run_until(
        &mut self,
        cancel: CancellationToken,
        mut control_rx: mpsc::UnboundedReceiver<ControlEvent>,
        mut work_rx: mpsc::UnboundedReceiver<WorkloadKey>,
    ) -> Result<(), Error> {
        let mut resync = tokio::time::interval(self.config.engine.resync_interval);
        resync.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown requested");
                    break;
                }
                Some(event) = control_rx.recv() => {
                    self.handle_control(event).await?;
                }
                Some(key) = work_rx.recv() => {
                    match self.reconcile(&key).await {
                        Ok(report) => debug!(
                            workload = %key,
                            outcome = ?report.outcome,
                            violations = report.violations,
                            terminated = report.terminated,
                            "pass finished"
                        ),
                        Err(err) => warn!(
                            workload = %key,
                            %err,
                            "reconciliation failed; awaiting redelivery"
                        ),
                    }
                }
                _ = resync.tick() => {
                    if let Err(err) = self.resync_policies().await {
                        warn!(%err, "policy resync failed");
                    }
                }
            }
        }

        Ok(())
    }

    /// Total passes started so far.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    async fn handle_control(&mut self, event: ControlEvent) -> Result<(), Error> {
        match event {
            ControlEvent::Reload(bundle) => {
                self.apply_reload(*bundle);
                info!("config reloaded");
            }
            ControlEvent::DumpStatus => {
                self.dump_status().await?;
            }
            ControlEvent::ResyncNow => {
                self.resync_policies().await?;
                info!("policy statuses refreshed");
            }
        }
        Ok(())
    }

    fn apply_reload(&mut self, bundle: ReloadBundle) {
        self.config = bundle.config;
        self.services.detector = bundle.detector;
        self.services.enforcer = bundle.enforcer;
        self.services.sink = bundle.sink;
        self.aggregator =
            StatusAggregator::new(self.policies.clone(), self.config.engine.status_retry_limit);
    }

    async fn dump_status(&self) -> Result<(), Error> {
        let policies = self.policies.list().await?;
        info!(passes = self.passes(), policy_count = policies.len(), "engine summary");
        for policy in &policies {
            info!(
                policy = %policy.name,
                mode = ?policy.spec.enforcement_mode,
                violations = policy.status.violations_count,
                terminations = policy.status.terminations_count,
                phase = ?policy.status.phase,
                "policy status"
            );
        }
        Ok(())
    }
}
