/*!
Ping record types shared by the TCP and HTTP probes.

A `PingRecord` is the atomic unit of history: one record per probe
invocation, holding one event per attempt plus the aggregated round-trip
statistics. Records are created in full by a single invocation, never
mutated afterwards, and only ever dropped by the retention-window prune
in the record store.

The JSON shape is load-bearing: record files are read back by the status
page layer, so field names and nesting must round-trip exactly.
*/

use serde::{Deserialize, Serialize};

use crate::config::HttpMethod;

/// Current wall-clock time as epoch milliseconds, for `ranAt` stamps.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Round to 4 decimal places, the precision kept for aggregate latencies.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Round-trip time aggregate in milliseconds, over successful attempts only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoundTripTime {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

impl RoundTripTime {
    /// Aggregate successful attempt latencies.
    ///
    /// With no samples every field is 0 - a defined floor value so the
    /// downstream status computation never sees NaN or infinities.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut min = f64::MAX;
        let mut max = 0.0_f64;
        let mut sum = 0.0_f64;
        for &sample in samples {
            if sample < min {
                min = sample;
            }
            if sample > max {
                max = sample;
            }
            sum += sample;
        }

        Self {
            min: round4(min),
            max: round4(max),
            avg: round4(sum / samples.len() as f64),
        }
    }
}

/// Name/message pair captured from a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptError {
    pub name: String,
    pub message: String,
}

impl AttemptError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Synthesized when an attempt exceeds its deadline without resolving.
    pub fn timeout() -> Self {
        Self::new("Error", "Request timeout")
    }

    pub fn from_io(err: &std::io::Error) -> Self {
        Self::new(io_error_name(err.kind()), err.to_string())
    }
}

fn io_error_name(kind: std::io::ErrorKind) -> &'static str {
    use std::io::ErrorKind;
    match kind {
        ErrorKind::ConnectionRefused => "ConnectionRefused",
        ErrorKind::ConnectionReset => "ConnectionReset",
        ErrorKind::ConnectionAborted => "ConnectionAborted",
        ErrorKind::HostUnreachable => "HostUnreachable",
        ErrorKind::NetworkUnreachable => "NetworkUnreachable",
        ErrorKind::AddrNotAvailable => "AddrNotAvailable",
        ErrorKind::TimedOut => "TimedOut",
        ErrorKind::PermissionDenied => "PermissionDenied",
        ErrorKind::InvalidInput => "InvalidInput",
        _ => "Error",
    }
}

/// Outcome of one TCP connect attempt.
///
/// Serialized with a `success` boolean discriminant; decode goes through a
/// raw shape so a record claiming `success: true` without a latency (or the
/// reverse) fails fast instead of round-tripping half-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTcpEvent", into = "RawTcpEvent")]
pub enum TcpEvent {
    Success { time: f64 },
    Failure { error: AttemptError },
}

impl TcpEvent {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Latency of a successful attempt, in milliseconds.
    pub fn time(&self) -> Option<f64> {
        match self {
            Self::Success { time } => Some(*time),
            Self::Failure { .. } => None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct RawTcpEvent {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<AttemptError>,
}

impl From<TcpEvent> for RawTcpEvent {
    fn from(event: TcpEvent) -> Self {
        match event {
            TcpEvent::Success { time } => Self {
                success: true,
                time: Some(time),
                error: None,
            },
            TcpEvent::Failure { error } => Self {
                success: false,
                time: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<RawTcpEvent> for TcpEvent {
    type Error = String;

    fn try_from(raw: RawTcpEvent) -> Result<Self, String> {
        match raw {
            RawTcpEvent {
                success: true,
                time: Some(time),
                error: None,
            } => Ok(Self::Success { time }),
            RawTcpEvent {
                success: false,
                time: None,
                error: Some(error),
            } => Ok(Self::Failure { error }),
            RawTcpEvent { success, .. } => {
                Err(format!("malformed tcp ping event (success = {success})"))
            }
        }
    }
}

/// Outcome of one HTTP request attempt.
///
/// A failure still carries the response status when one was obtained
/// (`null` when the request died below the HTTP layer); rejected status
/// codes omit the latency, matching the stored history format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHttpEvent", into = "RawHttpEvent")]
pub enum HttpEvent {
    Success {
        status: u16,
        time: f64,
    },
    Failure {
        status: Option<u16>,
        error: AttemptError,
    },
}

impl HttpEvent {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn time(&self) -> Option<f64> {
        match self {
            Self::Success { time, .. } => Some(*time),
            Self::Failure { .. } => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::Failure { status, .. } => *status,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct RawHttpEvent {
    success: bool,
    // Always serialized: failures without a response carry an explicit null.
    status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<AttemptError>,
}

impl From<HttpEvent> for RawHttpEvent {
    fn from(event: HttpEvent) -> Self {
        match event {
            HttpEvent::Success { status, time } => Self {
                success: true,
                status: Some(status),
                time: Some(time),
                error: None,
            },
            HttpEvent::Failure { status, error } => Self {
                success: false,
                status,
                time: None,
                error: Some(error),
            },
        }
    }
}

impl TryFrom<RawHttpEvent> for HttpEvent {
    type Error = String;

    fn try_from(raw: RawHttpEvent) -> Result<Self, String> {
        match raw {
            RawHttpEvent {
                success: true,
                status: Some(status),
                time: Some(time),
                error: None,
            } => Ok(Self::Success { status, time }),
            RawHttpEvent {
                success: false,
                status,
                time: None,
                error: Some(error),
            } => Ok(Self::Failure { status, error }),
            RawHttpEvent { success, .. } => {
                Err(format!("malformed http ping event (success = {success})"))
            }
        }
    }
}

/// History entry for one TCP probe invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpPingRecord {
    /// Invocation start, epoch milliseconds. Immutable.
    pub ran_at: i64,
    pub time: RoundTripTime,
    /// One event per attempt, in attempt order.
    pub events: Vec<TcpEvent>,
}

/// History entry for one HTTP probe invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpPingRecord {
    /// Invocation start, epoch milliseconds. Immutable.
    pub ran_at: i64,
    /// The verb actually used for the requests.
    pub method: HttpMethod,
    pub time: RoundTripTime,
    /// One event per attempt, in attempt order.
    pub events: Vec<HttpEvent>,
}

/// One probe invocation's outcome, tagged by server type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PingRecord {
    Tcp(TcpPingRecord),
    Http(HttpPingRecord),
}

impl PingRecord {
    /// Discriminant as stored in the record file.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tcp(_) => "tcp",
            Self::Http(_) => "http",
        }
    }

    pub fn ran_at(&self) -> i64 {
        match self {
            Self::Tcp(record) => record.ran_at,
            Self::Http(record) => record.ran_at,
        }
    }

    pub fn time(&self) -> &RoundTripTime {
        match self {
            Self::Tcp(record) => &record.time,
            Self::Http(record) => &record.time,
        }
    }

    pub fn events_len(&self) -> usize {
        match self {
            Self::Tcp(record) => record.events.len(),
            Self::Http(record) => record.events.len(),
        }
    }

    pub fn success_count(&self) -> usize {
        match self {
            Self::Tcp(record) => record.events.iter().filter(|e| e.is_success()).count(),
            Self::Http(record) => record.events.iter().filter(|e| e.is_success()).count(),
        }
    }

    /// Fraction of successful attempts in this record.
    ///
    /// A record with zero attempts yields 0.0, which classifies as
    /// critical downstream.
    pub fn success_ratio(&self) -> f64 {
        let total = self.events_len();
        if total == 0 {
            return 0.0;
        }
        self.success_count() as f64 / total as f64
    }
}
