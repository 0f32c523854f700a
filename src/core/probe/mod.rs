pub mod driver;
pub mod http;
pub mod status_range;
pub mod tcp;
pub mod types;

// Re-export commonly used items
pub use driver::{DriverError, ProbeDriver};
pub use http::{HttpProbe, HttpTransport, TransportError};
pub use tcp::{TcpConnect, TcpProbe};
pub use types::*;

/// Configuration-level probe errors, fatal to the whole invocation.
///
/// Attempt-level faults (refused connections, DNS failures, timeouts,
/// rejected status codes) never surface here; they become failure events
/// inside the ping record instead.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Raised before any attempt is made.
    #[error("port {0} is out of range")]
    PortOutOfRange(u16),
    #[error("failed to create http client: {0}")]
    HttpClient(String),
}
