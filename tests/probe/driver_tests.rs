//! End-to-end driver tests: config in, persisted record out.

use std::sync::Arc;

use serial_test::serial;
use tokio::net::TcpListener;

use pingmon::config::ServerConfig;
use pingmon::core::probe::{DriverError, PingRecord, ProbeDriver};
use pingmon::core::store::{FileRecordStore, InMemoryRecordStore, RecordStore};

use crate::common::{temp_data_dir, EnvGuard};

fn server_from_json(json: serde_json::Value) -> ServerConfig {
    serde_json::from_value(json).expect("valid server config")
}

#[tokio::test]
async fn tcp_probe_against_closed_port_records_failures() {
    let data_dir = temp_data_dir();
    let server = server_from_json(serde_json::json!({
        "id": "a",
        "name": "A",
        "serverType": "tcp",
        "host": {"from": "config", "value": "127.0.0.1"},
        "port": {"from": "config", "value": 1},
        "pingAttempts": 2,
        "maxRecordHistory": 86_400_000_u64
    }));

    let driver = ProbeDriver::new(Box::new(FileRecordStore::new(data_dir.path())));
    let record = driver.run(&server).await.expect("invocation completes");

    assert_eq!(record.kind(), "tcp");
    assert_eq!(record.events_len(), 2);
    assert_eq!(record.success_count(), 0);

    // The record landed in the target's history file.
    let store = FileRecordStore::new(data_dir.path());
    let stored = store.read_all("a").await.expect("read back");
    assert_eq!(stored, vec![record]);
}

#[tokio::test]
async fn http_probe_against_refused_port_records_failure() {
    let data_dir = temp_data_dir();
    let server = server_from_json(serde_json::json!({
        "id": "b",
        "name": "B",
        "serverType": "http",
        "url": {"from": "config", "value": "http://127.0.0.1:9/"},
        "pingAttempts": 1,
        "maxRecordHistory": 86_400_000_u64
    }));

    let driver = ProbeDriver::new(Box::new(FileRecordStore::new(data_dir.path())));
    let record = driver.run(&server).await.expect("invocation completes");

    assert_eq!(record.kind(), "http");
    assert_eq!(record.events_len(), 1);
    assert_eq!(record.success_count(), 0);
    match &record {
        PingRecord::Http(http) => assert_eq!(http.events[0].status(), None),
        PingRecord::Tcp(_) => panic!("expected http record"),
    }

    let store = FileRecordStore::new(data_dir.path());
    assert_eq!(store.read_all("b").await.expect("read back").len(), 1);
}

#[tokio::test]
#[serial]
async fn env_sourced_host_and_port_resolve_at_probe_time() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let _host = EnvGuard::set("PINGMON_TEST_HOST", "127.0.0.1");
    let _port = EnvGuard::set("PINGMON_TEST_PORT", &port.to_string());

    let server = server_from_json(serde_json::json!({
        "id": "envy",
        "name": "Env",
        "serverType": "tcp",
        "host": {"from": "env", "value": "PINGMON_TEST_HOST"},
        "port": {"from": "env", "value": "PINGMON_TEST_PORT"},
        "pingAttempts": 1,
        "maxRecordHistory": 86_400_000_u64
    }));

    let store = Arc::new(InMemoryRecordStore::new());
    let driver = ProbeDriver::new(Box::new(Arc::clone(&store)));
    let record = driver.run(&server).await.expect("invocation completes");

    assert_eq!(record.success_count(), 1);
    assert_eq!(store.read_all("envy").await.expect("read back").len(), 1);
}

#[tokio::test]
#[serial]
async fn unset_env_port_fails_without_writing_a_record() {
    let _unset = EnvGuard::unset("PINGMON_MISSING_PORT");

    let server = server_from_json(serde_json::json!({
        "id": "noport",
        "name": "NoPort",
        "serverType": "tcp",
        "host": {"from": "config", "value": "127.0.0.1"},
        "port": {"from": "env", "value": "PINGMON_MISSING_PORT"},
        "pingAttempts": 1,
        "maxRecordHistory": 86_400_000_u64
    }));

    let store = Arc::new(InMemoryRecordStore::new());
    let driver = ProbeDriver::new(Box::new(Arc::clone(&store)));

    let err = driver.run(&server).await.unwrap_err();
    assert!(matches!(err, DriverError::UnresolvedPort { ref name } if name == "PINGMON_MISSING_PORT"));

    // Fatal configuration errors write nothing.
    assert!(store.read_all("noport").await.expect("read back").is_empty());
}

#[tokio::test]
#[serial]
async fn unset_env_host_degrades_into_attempt_failures() {
    let _unset = EnvGuard::unset("PINGMON_MISSING_HOST");

    let server = server_from_json(serde_json::json!({
        "id": "nohost",
        "name": "NoHost",
        "serverType": "tcp",
        "host": {"from": "env", "value": "PINGMON_MISSING_HOST"},
        "port": {"from": "config", "value": 80},
        "pingAttempts": 1,
        "maxRecordHistory": 86_400_000_u64
    }));

    let store = Arc::new(InMemoryRecordStore::new());
    let driver = ProbeDriver::new(Box::new(Arc::clone(&store)));
    let record = driver.run(&server).await.expect("invocation completes");

    // The empty host fails per-attempt, not fatally: the record exists
    // and every event is a failure.
    assert_eq!(record.events_len(), 1);
    assert_eq!(record.success_count(), 0);
    assert_eq!(store.read_all("nohost").await.expect("read back").len(), 1);
}

#[tokio::test]
async fn repeated_invocations_accumulate_history() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let server = server_from_json(serde_json::json!({
        "id": "twice",
        "name": "Twice",
        "serverType": "tcp",
        "host": {"from": "config", "value": "127.0.0.1"},
        "port": {"from": "config", "value": port},
        "pingAttempts": 1,
        "maxRecordHistory": 86_400_000_u64
    }));

    let store = Arc::new(InMemoryRecordStore::new());
    let driver = ProbeDriver::new(Box::new(Arc::clone(&store)));
    driver.run(&server).await.expect("first invocation");
    driver.run(&server).await.expect("second invocation");

    let stored = store.read_all("twice").await.expect("read back");
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|record| record.kind() == "tcp"));
}
