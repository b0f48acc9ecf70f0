#![forbid(unsafe_code)]

mod http_sink;

pub use http_sink::HttpEventSink;

use crate::domain::ViolationRecord;
use crate::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one violation record. Best effort from the caller's point of
    /// view: the engine logs and swallows any error returned here.
    async fn emit(&self, record: &ViolationRecord) -> Result<(), Error>;
}

/// Sink used when no audit endpoint is configured.
#[derive(Debug, Default)]
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    async fn emit(&self, _record: &ViolationRecord) -> Result<(), Error> {
        Ok(())
    }
}

/// Wire form of a violation record, matching the audit-service contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    pub timestamp: String,
    pub event_type: &'static str,
    pub severity: &'static str,
    pub pod_name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub reason: String,
    pub action: &'static str,
    pub policy_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    pub description: String,
}

impl SecurityEvent {
    pub fn from_record(record: &ViolationRecord, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            event_type: record.event_type.as_str(),
            severity: record.severity.as_str(),
            pod_name: record.subject.name().to_string(),
            namespace: record.subject.namespace().to_string(),
            container: record.container.clone(),
            image: record.image.clone(),
            reason: record.reason.clone(),
            action: record.proposed_action.as_str(),
            policy_name: record.policy_name.clone(),
            node_name: record.node_name.clone(),
            description: record.description.clone(),
        }
    }
}
