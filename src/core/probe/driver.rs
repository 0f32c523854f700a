/*!
Probe driver: one resolved target in, one persisted ping record out.

The driver dereferences indirect configuration values against the
current process environment (at probe time, so rotated secrets take
effect immediately), dispatches to the TCP or HTTP probe with the
target's attempt count, then hands the record to the injected store
together with the target's retention window.
*/

use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::config::{Endpoint, ServerConfig};
use crate::core::debug_logger::get_debug_logger;
use crate::core::probe::http::{self, HttpProbe};
use crate::core::probe::tcp::{self, TcpProbe};
use crate::core::probe::types::PingRecord;
use crate::core::probe::ProbeError;
use crate::core::store::{RecordStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A port has to be numeric before any attempt can be made, so an
    /// unset or non-numeric port variable is fatal rather than a
    /// degraded attempt.
    #[error("environment variable \"{name}\" does not resolve to a valid port")]
    UnresolvedPort { name: String },
}

pub struct ProbeDriver {
    store: Box<dyn RecordStore>,
    tcp_timeout: Duration,
    http_timeout: Duration,
}

impl ProbeDriver {
    pub fn new(store: Box<dyn RecordStore>) -> Self {
        let tcp_timeout = timeout_env_override()
            .unwrap_or(tcp::DEFAULT_TIMEOUT_MS);
        Self {
            store,
            tcp_timeout: Duration::from_millis(tcp_timeout),
            http_timeout: Duration::from_millis(http::DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_tcp_timeout(mut self, timeout: Duration) -> Self {
        self.tcp_timeout = timeout;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Probe one target and append the outcome to its history.
    ///
    /// A completed record exists after every non-fatal invocation, even
    /// when all attempts failed; fatal errors (bad port, store faults)
    /// write nothing.
    pub async fn run(&self, server: &ServerConfig) -> Result<PingRecord, DriverError> {
        let logger = get_debug_logger();
        let probe_id = format!("probe_{}", Uuid::new_v4());
        logger.probe_start(
            &server.id,
            server.endpoint.kind(),
            server.ping_attempts,
            probe_id.clone(),
        );
        let started = Instant::now();

        let record = match &server.endpoint {
            Endpoint::Http(endpoint) => {
                let url = endpoint.url.resolve().unwrap_or_else(|| {
                    logger.debug_sync(
                        "ProbeDriver",
                        "resolve",
                        &format!("url variable for \"{}\" is unset", server.id),
                    );
                    String::new()
                });
                let probe = HttpProbe::new()?.with_timeout(self.http_timeout);
                probe
                    .probe(
                        endpoint.method,
                        &url,
                        server.ping_attempts,
                        &endpoint.status_codes,
                    )
                    .await
            }
            Endpoint::Tcp(endpoint) => {
                let host = endpoint.host.resolve().unwrap_or_else(|| {
                    logger.debug_sync(
                        "ProbeDriver",
                        "resolve",
                        &format!("host variable for \"{}\" is unset", server.id),
                    );
                    String::new()
                });
                let port =
                    endpoint
                        .port
                        .resolve()
                        .ok_or_else(|| DriverError::UnresolvedPort {
                            name: endpoint.port.env_name().unwrap_or_default().to_string(),
                        })?;
                TcpProbe::new()
                    .with_timeout(self.tcp_timeout)
                    .probe(&host, port, server.ping_attempts)
                    .await?
            }
        };

        logger.probe_end(
            &server.id,
            record.events_len(),
            record.success_count(),
            started.elapsed().as_millis() as u64,
            probe_id,
        );

        self.store
            .append(&server.id, record.clone(), server.max_record_history)
            .await?;
        logger.record_write_summary(&server.id, record.kind(), record.events_len());

        Ok(record)
    }
}

/// Connect-timeout override, capped so a typo cannot park an invocation
/// for hours.
fn timeout_env_override() -> Option<u64> {
    let raw = std::env::var("PINGMON_TIMEOUT_MS").ok()?;
    let timeout = raw.trim().parse::<u64>().ok()?;
    Some(timeout.min(60_000))
}
