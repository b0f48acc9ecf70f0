#![forbid(unsafe_code)]

use reconciler::{
    Error, EventSink, EventType, HttpEventSink, ProposedAction, ViolationRecord, WorkloadKey,
};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn record() -> ViolationRecord {
    let mut record = ViolationRecord::new(
        EventType::DisallowedRegistry,
        WorkloadKey::new("payments", "worker-1"),
        "trusted-registries",
    );
    record.container = Some("app".into());
    record.image = Some("evil.io/malware:latest".into());
    record.reason = "Image from disallowed registry: evil.io".into();
    record.description =
        "Container 'app' uses image from registry 'evil.io' which is not in the allowed list"
            .into();
    record.proposed_action = ProposedAction::Audit;
    record
}

#[tokio::test]
async fn emits_json_payload_to_log_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/log"))
        .and(body_partial_json(serde_json::json!({
            "eventType": "DISALLOWED_REGISTRY",
            "severity": "HIGH",
            "podName": "worker-1",
            "namespace": "payments",
            "action": "AUDIT",
            "policyName": "trusted-registries",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpEventSink::new(server.uri(), Duration::from_secs(5)).unwrap();
    sink.emit(&record()).await.unwrap();
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/log"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sink =
        HttpEventSink::new(format!("{}/", server.uri()), Duration::from_secs(5)).unwrap();
    sink.emit(&record()).await.unwrap();
}

#[tokio::test]
async fn non_success_status_is_an_emission_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/log"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let sink = HttpEventSink::new(server.uri(), Duration::from_secs(5)).unwrap();
    let err = sink.emit(&record()).await.unwrap_err();
    assert!(matches!(err, Error::Emission(_)));
}

#[tokio::test]
async fn unreachable_sink_is_an_emission_error() {
    // Closed port; the transport error must map to Emission, which the
    // engine swallows.
    let sink = HttpEventSink::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
    let err = sink.emit(&record()).await.unwrap_err();
    assert!(matches!(err, Error::Emission(_)));
}

#[tokio::test]
async fn slow_sink_hits_the_client_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/log"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let sink = HttpEventSink::new(server.uri(), Duration::from_millis(100)).unwrap();
    let err = sink.emit(&record()).await.unwrap_err();
    assert!(matches!(err, Error::Emission(_)));
}
