#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyPhase {
    Active,
    Inactive,
    Error,
}

impl PolicyPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// One observation about the policy's state, keyed by `condition_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub condition_type: String,
    pub status: ConditionStatus,
    pub reason: String,
    pub message: String,
    pub last_transition_time: DateTime<Utc>,
}

/// Observed state of one policy. Written only by the reconciler; the
/// counters are monotonic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicyStatus {
    /// `None` until the policy has been observed for the first time.
    pub phase: Option<PolicyPhase>,
    pub last_enforcement_time: Option<DateTime<Utc>>,
    pub violations_count: u64,
    pub terminations_count: u64,
    /// Spec generation the rest of this status reflects.
    pub observed_generation: u64,
    pub message: String,
    pub conditions: Vec<Condition>,
}

impl PolicyStatus {
    /// Replace the condition with the same type, or append a new one.
    pub fn upsert_condition(&mut self, condition: Condition) {
        match self
            .conditions
            .iter_mut()
            .find(|existing| existing.condition_type == condition.condition_type)
        {
            Some(existing) => *existing = condition,
            None => self.conditions.push(condition),
        }
    }

    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|condition| condition.condition_type == condition_type)
    }
}
