//! Shared test utilities.

use std::env;

use tempfile::TempDir;

use pingmon::core::probe::types::{
    AttemptError, HttpEvent, HttpPingRecord, PingRecord, RoundTripTime, TcpEvent, TcpPingRecord,
};

pub fn temp_data_dir() -> TempDir {
    tempfile::tempdir().expect("create temp directory")
}

/// Sets or unsets an environment variable and restores the previous
/// value on drop. Tests using this must run serialized.
pub struct EnvGuard {
    name: String,
    original: Option<String>,
}

impl EnvGuard {
    pub fn set(name: &str, value: &str) -> Self {
        let original = env::var(name).ok();
        env::set_var(name, value);
        Self {
            name: name.to_string(),
            original,
        }
    }

    pub fn unset(name: &str) -> Self {
        let original = env::var(name).ok();
        env::remove_var(name);
        Self {
            name: name.to_string(),
            original,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.original {
            Some(value) => env::set_var(&self.name, value),
            None => env::remove_var(&self.name),
        }
    }
}

pub fn tcp_record(ran_at: i64) -> PingRecord {
    PingRecord::Tcp(TcpPingRecord {
        ran_at,
        time: RoundTripTime::from_samples(&[1.5]),
        events: vec![TcpEvent::Success { time: 1.5 }],
    })
}

pub fn tcp_failure_record(ran_at: i64) -> PingRecord {
    PingRecord::Tcp(TcpPingRecord {
        ran_at,
        time: RoundTripTime::default(),
        events: vec![TcpEvent::Failure {
            error: AttemptError::timeout(),
        }],
    })
}

pub fn http_record(ran_at: i64) -> PingRecord {
    PingRecord::Http(HttpPingRecord {
        ran_at,
        method: Default::default(),
        time: RoundTripTime::from_samples(&[12.25]),
        events: vec![HttpEvent::Success {
            status: 200,
            time: 12.25,
        }],
    })
}
