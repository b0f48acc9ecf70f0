#![forbid(unsafe_code)]

use crate::domain::ViolationRecord;
use crate::emission::{EventSink, SecurityEvent};
use crate::error::Error;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tracing::trace;

/// POSTs each record as JSON to `{base_url}/log`. Every request is bounded
/// by the client timeout; the timestamp on the wire is the delivery time.
#[derive(Debug, Clone)]
pub struct HttpEventSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEventSink {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| Error::Emission(err.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn endpoint(&self) -> String {
        format!("{}/log", self.base_url)
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn emit(&self, record: &ViolationRecord) -> Result<(), Error> {
        let event = SecurityEvent::from_record(record, Utc::now());
        let response = self
            .client
            .post(self.endpoint())
            .json(&event)
            .send()
            .await
            .map_err(|err| Error::Emission(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Emission(format!(
                "audit service returned {status}"
            )));
        }
        trace!(event_type = event.event_type, "event delivered");
        Ok(())
    }
}
