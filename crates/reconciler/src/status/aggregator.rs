#![forbid(unsafe_code)]

use crate::error::Error;
use crate::policy::{
    Condition, ConditionStatus, Policy, PolicyPhase, PolicyStatus, PolicyStore, StatusWrite,
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{debug, trace};

/// Apply the status delta for one reconciliation pass that produced at
/// least one violation under the policy. The counters only ever grow.
pub fn apply_pass(status: &mut PolicyStatus, was_terminated: bool, now: DateTime<Utc>) {
    status.violations_count += 1;
    status.phase = Some(PolicyPhase::Active);
    if was_terminated {
        status.terminations_count += 1;
        status.last_enforcement_time = Some(now);
        status.message = format!(
            "Last termination at {}",
            now.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }
}

/// Bring a status up to date with the policy's spec generation. Returns the
/// new status to commit, or `None` when nothing changed.
fn plan_generation(policy: &Policy, now: DateTime<Utc>) -> Option<PolicyStatus> {
    let mut status = policy.status.clone();

    if status.phase.is_none() {
        status.phase = Some(PolicyPhase::Active);
        status.observed_generation = policy.generation;
        status.message = "Policy is active and monitoring workloads".into();
        status.upsert_condition(Condition {
            condition_type: "Ready".into(),
            status: ConditionStatus::True,
            reason: "PolicyActive".into(),
            message: "Policy is active and monitoring workloads".into(),
            last_transition_time: now,
        });
        return Some(status);
    }

    if status.observed_generation != policy.generation {
        status.observed_generation = policy.generation;
        status.message = "Policy configuration updated".into();
        status.upsert_condition(Condition {
            condition_type: "Ready".into(),
            status: ConditionStatus::True,
            reason: "PolicyUpdated".into(),
            message: "Policy configuration was updated".into(),
            last_transition_time: now,
        });
        return Some(status);
    }

    None
}

/// Serializes counter updates onto shared policy records through optimistic
/// read-modify-write cycles. A conflicting write re-reads the policy and
/// re-applies the delta so no increment is lost.
pub struct StatusAggregator {
    store: Arc<dyn PolicyStore>,
    retry_limit: u32,
}

impl StatusAggregator {
    pub fn new(store: Arc<dyn PolicyStore>, retry_limit: u32) -> Self {
        Self {
            store,
            retry_limit: retry_limit.max(1),
        }
    }

    /// Record one pass over `policy_name`. Invoked once per policy per pass
    /// whenever that policy produced violations, terminated or not.
    pub async fn record_pass(
        &self,
        policy_name: &str,
        was_terminated: bool,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        for attempt in 1..=self.retry_limit {
            let Some(policy) = self.store.get(policy_name).await? else {
                debug!(policy = policy_name, "policy vanished before status update");
                return Ok(());
            };

            let mut status = policy.status.clone();
            apply_pass(&mut status, was_terminated, now);

            match self
                .store
                .update_status(policy_name, policy.resource_version, status)
                .await?
            {
                StatusWrite::Applied => return Ok(()),
                StatusWrite::Missing => return Ok(()),
                StatusWrite::Conflict => {
                    trace!(policy = policy_name, attempt, "status write conflicted");
                }
            }
        }

        Err(Error::StatusConflict {
            policy: policy_name.to_string(),
            attempts: self.retry_limit,
        })
    }

    /// Initialize a fresh status, or record that the spec generation moved.
    /// The observed generation and the fields describing it land in one
    /// write, so a committed `observed_generation` always reflects its
    /// configuration.
    pub async fn observe_generation(
        &self,
        policy_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        for attempt in 1..=self.retry_limit {
            let Some(policy) = self.store.get(policy_name).await? else {
                debug!(policy = policy_name, "policy vanished before status refresh");
                return Ok(());
            };

            let Some(status) = plan_generation(&policy, now) else {
                return Ok(());
            };

            match self
                .store
                .update_status(policy_name, policy.resource_version, status)
                .await?
            {
                StatusWrite::Applied => {
                    debug!(
                        policy = policy_name,
                        generation = policy.generation,
                        "policy status refreshed"
                    );
                    return Ok(());
                }
                StatusWrite::Missing => return Ok(()),
                StatusWrite::Conflict => {
                    trace!(policy = policy_name, attempt, "status refresh conflicted");
                }
            }
        }

        Err(Error::StatusConflict {
            policy: policy_name.to_string(),
            attempts: self.retry_limit,
        })
    }
}
