//! HTTP probe tests with a scripted transport.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use pingmon::config::HttpMethod;
use pingmon::core::probe::types::{HttpEvent, PingRecord};
use pingmon::core::probe::{HttpProbe, HttpTransport, TransportError};

/// Transport returning canned results in order, one per attempt.
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<u16, TransportError>>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<u16, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send_request(
        &self,
        _method: HttpMethod,
        _url: &str,
        _timeout: Duration,
    ) -> Result<u16, TransportError> {
        // A small delay keeps measured latencies strictly positive.
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.responses
            .lock()
            .await
            .pop_front()
            .expect("scripted response available")
    }
}

fn probe_with(responses: Vec<Result<u16, TransportError>>) -> HttpProbe {
    HttpProbe::new()
        .expect("create probe")
        .with_transport(Box::new(ScriptedTransport::new(responses)))
}

fn connection_error() -> TransportError {
    TransportError {
        name: "ConnectionFailed".to_string(),
        message: "failed to connect to the server".to_string(),
        status: None,
    }
}

fn http_events(record: &PingRecord) -> &[HttpEvent] {
    match record {
        PingRecord::Http(record) => &record.events,
        PingRecord::Tcp(_) => panic!("expected an http record"),
    }
}

#[tokio::test]
async fn accepted_status_yields_success_event() {
    let probe = probe_with(vec![Ok(200)]);
    let record = probe
        .probe(HttpMethod::Get, "https://example.com", 1, "200-299")
        .await;

    assert_eq!(record.kind(), "http");
    let events = http_events(&record);
    assert_eq!(events.len(), 1);
    match &events[0] {
        HttpEvent::Success { status, time } => {
            assert_eq!(*status, 200);
            assert!(*time > 0.0);
        }
        HttpEvent::Failure { .. } => panic!("accepted status must succeed"),
    }
}

#[tokio::test]
async fn rejected_status_yields_invalid_status_failure() {
    let probe = probe_with(vec![Ok(404)]);
    let record = probe
        .probe(HttpMethod::Get, "https://example.com", 1, "200-299")
        .await;

    match &http_events(&record)[0] {
        HttpEvent::Failure { status, error } => {
            assert_eq!(*status, Some(404));
            assert_eq!(error.name, "Invalid Status");
            assert_eq!(
                error.message,
                "Status 404 is not in the accepted status list."
            );
        }
        HttpEvent::Success { .. } => panic!("rejected status must fail"),
    }

    // The rejected attempt contributes no latency sample.
    let time = record.time();
    assert_eq!((time.min, time.max, time.avg), (0.0, 0.0, 0.0));
}

#[tokio::test]
async fn acceptance_expression_can_bless_any_code() {
    let probe = probe_with(vec![Ok(301)]);
    let record = probe
        .probe(HttpMethod::Head, "https://example.com", 1, "301")
        .await;
    assert!(http_events(&record)[0].is_success());
}

#[tokio::test]
async fn transport_failure_without_status_is_null_status_failure() {
    let probe = probe_with(vec![Err(connection_error())]);
    let record = probe
        .probe(HttpMethod::Get, "https://example.com", 1, "200-299")
        .await;

    match &http_events(&record)[0] {
        HttpEvent::Failure { status, error } => {
            assert_eq!(*status, None);
            assert_eq!(error.name, "ConnectionFailed");
            assert_eq!(error.message, "failed to connect to the server");
        }
        HttpEvent::Success { .. } => panic!("transport failure must fail"),
    }
}

#[tokio::test]
async fn status_extracted_from_transport_failure_can_still_pass() {
    // Some transports surface a received response as an error; an
    // extracted, accepted status still counts as success.
    let probe = probe_with(vec![Err(TransportError {
        name: "ResponseError".to_string(),
        message: "request failed with status".to_string(),
        status: Some(204),
    })]);
    let record = probe
        .probe(HttpMethod::Get, "https://example.com", 1, "200-299")
        .await;

    match &http_events(&record)[0] {
        HttpEvent::Success { status, time } => {
            assert_eq!(*status, 204);
            assert!(*time > 0.0);
        }
        HttpEvent::Failure { .. } => panic!("extracted accepted status must succeed"),
    }
}

#[tokio::test]
async fn status_extracted_from_transport_failure_can_still_fail() {
    let probe = probe_with(vec![Err(TransportError {
        name: "ResponseError".to_string(),
        message: "request failed with status".to_string(),
        status: Some(503),
    })]);
    let record = probe
        .probe(HttpMethod::Get, "https://example.com", 1, "200-299")
        .await;

    match &http_events(&record)[0] {
        HttpEvent::Failure { status, .. } => assert_eq!(*status, Some(503)),
        HttpEvent::Success { .. } => panic!("rejected extracted status must fail"),
    }
}

#[tokio::test]
async fn attempts_run_in_order_and_aggregate_over_successes() {
    let probe = probe_with(vec![Ok(200), Ok(500), Ok(201)]);
    let record = probe
        .probe(HttpMethod::Get, "https://example.com", 3, "200-299")
        .await;

    let events = http_events(&record);
    assert_eq!(events.len(), 3);
    assert!(events[0].is_success());
    assert!(!events[1].is_success());
    assert!(events[2].is_success());

    let time = record.time();
    assert!(time.min > 0.0);
    assert!(time.min <= time.avg && time.avg <= time.max);
}

#[tokio::test]
async fn all_failures_keep_event_count_and_zero_aggregates() {
    let attempts = 4;
    let probe = probe_with(vec![
        Err(connection_error()),
        Err(connection_error()),
        Ok(500),
        Err(connection_error()),
    ]);
    let record = probe
        .probe(HttpMethod::Get, "https://example.com", attempts, "200-299")
        .await;

    assert_eq!(record.events_len(), attempts as usize);
    assert_eq!(record.success_count(), 0);
    let time = record.time();
    assert_eq!((time.min, time.max, time.avg), (0.0, 0.0, 0.0));
}

#[tokio::test]
async fn record_serializes_in_store_format() {
    let probe = probe_with(vec![Ok(200), Err(connection_error())]);
    let record = probe
        .probe(HttpMethod::Get, "https://example.com", 2, "200-299")
        .await;

    let value = serde_json::to_value(&record).expect("serializes");
    assert_eq!(value["type"], "http");
    assert_eq!(value["method"], "GET");
    assert_eq!(value["events"][0]["success"], true);
    assert_eq!(value["events"][0]["status"], 200);
    assert_eq!(value["events"][1]["success"], false);
    assert_eq!(value["events"][1]["status"], serde_json::Value::Null);
    assert!(value["events"][1].get("time").is_none());
}
