/*!
HTTP request probe.

Issues N strictly sequential requests against a URL and classifies each
attempt by elapsed time and response status. "Success" is defined by the
target's accepted-status expression, so a monitor can treat a 301 or 404
as healthy when that is what the endpoint is supposed to return.

The transport always carries an explicit request timeout; an unresponsive
host costs at most one timeout per attempt, never an unbounded hang.
*/

use std::time::{Duration, Instant};

use async_trait::async_trait;
use isahc::config::Configurable;
use isahc::{AsyncReadResponseExt, HttpClient, Request};

use crate::config::HttpMethod;
use crate::core::probe::status_range;
use crate::core::probe::types::{
    now_millis, AttemptError, HttpEvent, HttpPingRecord, PingRecord, RoundTripTime,
};
use crate::core::probe::ProbeError;

/// Per-request deadline when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Transport-level failure surfaced by the HTTP client.
///
/// `status` is populated when the transport attached a response status to
/// the failure. isahc reports non-2xx responses as ordinary responses, so
/// its errors never carry one; the field keeps the contract explicit for
/// transports (and test doubles) that do.
#[derive(Debug, Clone)]
pub struct TransportError {
    pub name: String,
    pub message: String,
    pub status: Option<u16>,
}

/// HTTP client abstraction for dependency injection and testing.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue one request and return the response status code.
    async fn send_request(
        &self,
        method: HttpMethod,
        url: &str,
        timeout: Duration,
    ) -> Result<u16, TransportError>;
}

/// Production transport backed by isahc.
pub struct IsahcTransport {
    client: HttpClient,
}

impl IsahcTransport {
    pub fn new() -> Result<Self, ProbeError> {
        let client = HttpClient::new().map_err(|e| ProbeError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for IsahcTransport {
    async fn send_request(
        &self,
        method: HttpMethod,
        url: &str,
        timeout: Duration,
    ) -> Result<u16, TransportError> {
        let request = Request::builder()
            .method(method.as_str())
            .uri(url)
            .timeout(timeout)
            .body(())
            .map_err(|e| TransportError {
                name: "Error".to_string(),
                message: e.to_string(),
                status: None,
            })?;

        let mut response = self
            .client
            .send_async(request)
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status().as_u16();

        // Consume the body so the request fully completes before the
        // next attempt starts.
        let _ = response.text().await.unwrap_or_default();

        Ok(status)
    }
}

fn transport_error(err: &isahc::Error) -> TransportError {
    use isahc::error::ErrorKind;

    let name = match err.kind() {
        ErrorKind::Timeout => "Timeout",
        ErrorKind::ConnectionFailed => "ConnectionFailed",
        ErrorKind::NameResolution => "NameResolution",
        ErrorKind::TlsEngine | ErrorKind::BadServerCertificate => "TlsFailure",
        ErrorKind::TooManyRedirects => "TooManyRedirects",
        ErrorKind::InvalidRequest => "InvalidRequest",
        ErrorKind::Io => "Io",
        _ => "Unknown Error",
    };

    TransportError {
        name: name.to_string(),
        message: err.to_string(),
        status: None,
    }
}

pub struct HttpProbe {
    transport: Box<dyn HttpTransport>,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new() -> Result<Self, ProbeError> {
        Ok(Self {
            transport: Box::new(IsahcTransport::new()?),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        })
    }

    /// Replace the transport (for testing).
    pub fn with_transport(mut self, transport: Box<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Override the per-request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one probe invocation against `url`.
    ///
    /// Infallible at the invocation level: every fault is recovered into
    /// a failure event and probing continues with the next attempt, so a
    /// completed record always exists afterwards.
    pub async fn probe(
        &self,
        method: HttpMethod,
        url: &str,
        attempts: u32,
        expect_status: &str,
    ) -> PingRecord {
        let ran_at = now_millis();

        let mut events = Vec::with_capacity(attempts as usize);
        for _ in 0..attempts {
            events.push(self.request_once(method, url, expect_status).await);
        }

        let samples: Vec<f64> = events.iter().filter_map(HttpEvent::time).collect();

        PingRecord::Http(HttpPingRecord {
            ran_at,
            method,
            time: RoundTripTime::from_samples(&samples),
            events,
        })
    }

    async fn request_once(&self, method: HttpMethod, url: &str, expect_status: &str) -> HttpEvent {
        let start = Instant::now();
        match self.transport.send_request(method, url, self.timeout).await {
            Ok(status) => {
                let time = start.elapsed().as_secs_f64() * 1000.0;
                if status_range::matches(Some(status), expect_status) {
                    HttpEvent::Success { status, time }
                } else {
                    rejected_status(status)
                }
            }
            Err(err) => {
                let time = start.elapsed().as_secs_f64() * 1000.0;
                // Some transports attach the response status to the
                // failure; an extracted, accepted status still counts.
                match err.status {
                    Some(status) if status_range::matches(Some(status), expect_status) => {
                        HttpEvent::Success { status, time }
                    }
                    status => HttpEvent::Failure {
                        status,
                        error: AttemptError::new(err.name, err.message),
                    },
                }
            }
        }
    }
}

fn rejected_status(status: u16) -> HttpEvent {
    HttpEvent::Failure {
        status: Some(status),
        error: AttemptError::new(
            "Invalid Status",
            format!("Status {status} is not in the accepted status list."),
        ),
    }
}
