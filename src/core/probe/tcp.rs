/*!
TCP connect probe.

Measures how long an outbound TCP connection to `host:port` takes to
establish. One invocation runs N strictly sequential attempts - each
connection fully resolves (connected, errored or timed out) before the
next one starts, so a slow target never sees a connection storm from its
own monitor. The connection is closed the moment it is established; no
payload is exchanged.
*/

use std::io;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::net::TcpStream;
use url::Url;

use crate::core::debug_logger::get_debug_logger;
use crate::core::probe::types::{
    now_millis, AttemptError, PingRecord, RoundTripTime, TcpEvent, TcpPingRecord,
};
use crate::core::probe::ProbeError;

/// Per-attempt connect deadline when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

/// Connection opener abstraction for dependency injection and testing.
#[async_trait]
pub trait TcpConnect: Send + Sync {
    async fn connect(&self, host: &str, port: u16) -> io::Result<TcpStream>;
}

/// Production connector backed by `tokio::net::TcpStream`.
///
/// Name resolution happens inside `connect`, so DNS failures surface as
/// ordinary attempt errors.
pub struct SystemConnector;

#[async_trait]
impl TcpConnect for SystemConnector {
    async fn connect(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        TcpStream::connect((host, port)).await
    }
}

pub struct TcpProbe {
    connector: Box<dyn TcpConnect>,
    timeout: Duration,
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpProbe {
    pub fn new() -> Self {
        Self {
            connector: Box::new(SystemConnector),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Replace the connector (for testing).
    pub fn with_connector(mut self, connector: Box<dyn TcpConnect>) -> Self {
        self.connector = connector;
        self
    }

    /// Override the per-attempt connect deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one probe invocation against `host:port`.
    ///
    /// `attempts == 0` is permitted and produces an empty record with the
    /// zero aggregate floor. The only fatal error is an out-of-range
    /// port, raised before any attempt is made; everything else becomes a
    /// failure event.
    pub async fn probe(
        &self,
        host: &str,
        port: u16,
        attempts: u32,
    ) -> Result<PingRecord, ProbeError> {
        if port < 1 {
            return Err(ProbeError::PortOutOfRange(port));
        }

        let address = host_component(host);
        let ran_at = now_millis();

        let mut events = Vec::with_capacity(attempts as usize);
        for _ in 0..attempts {
            // Strictly sequential: each attempt fully resolves first.
            events.push(self.connect_once(&address, port).await);
        }

        let samples: Vec<f64> = events.iter().filter_map(TcpEvent::time).collect();

        Ok(PingRecord::Tcp(TcpPingRecord {
            ran_at,
            time: RoundTripTime::from_samples(&samples),
            events,
        }))
    }

    async fn connect_once(&self, address: &str, port: u16) -> TcpEvent {
        let start = Instant::now();
        match tokio::time::timeout(self.timeout, self.connector.connect(address, port)).await {
            Ok(Ok(stream)) => {
                let time = start.elapsed().as_secs_f64() * 1000.0;
                // The connection itself was the measurement.
                drop(stream);
                TcpEvent::Success { time }
            }
            Ok(Err(err)) => TcpEvent::Failure {
                error: AttemptError::from_io(&err),
            },
            Err(_) => TcpEvent::Failure {
                error: AttemptError::timeout(),
            },
        }
    }
}

/// Accept a full URL where a bare host is expected and extract its host.
///
/// `RelativeUrlWithoutBase` is what a plain hostname parses to, so it
/// falls through silently; any other parse failure is logged and the raw
/// string used as-is rather than aborting the probe.
fn host_component(host: &str) -> String {
    match Url::parse(host) {
        Ok(url) => match url.host_str() {
            Some(parsed) => parsed.to_string(),
            None => host.to_string(),
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => host.to_string(),
        Err(err) => {
            get_debug_logger().debug_sync(
                "TcpProbe",
                "host_parse",
                &format!("not a url: {host} ({err})"),
            );
            host.to_string()
        }
    }
}
