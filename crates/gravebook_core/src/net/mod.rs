//! Backend transport and geocoding client.
//!
//! # Responsibility
//! - Define the narrow gateway contract every network call goes through.
//! - Keep connection-level failures distinguishable from HTTP-level ones,
//!   so callers can classify precisely.
//!
//! # Invariants
//! - The gateway performs no retries; retry policy lives in callers.
//! - A 2xx body is returned raw; decoding belongs to the caller so decode
//!   failures are classified at the right layer.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod gateway;
pub mod geocode;

pub type TransportResult<T> = Result<T, TransportError>;

/// HTTP verbs the backend surface actually uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Raw 2xx response handed back to callers for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
}

/// Transport failure, split so callers can tell "backend not running"
/// from "backend rejected the request".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused/reset, DNS failure, or no response within the
    /// timeout. The request never produced response bytes.
    Unreachable { detail: String },
    /// The backend answered with a non-2xx status. `suggestion` carries
    /// the server's actionable hint verbatim when it provided one.
    Http {
        status: u16,
        message: String,
        suggestion: Option<String>,
    },
    /// The request could not even be constructed (bad base URL or path).
    InvalidUrl { detail: String },
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable { detail } => {
                write!(f, "backend unreachable: {detail}")
            }
            Self::Http {
                status,
                message,
                suggestion,
            } => {
                write!(f, "backend returned HTTP {status}: {message}")?;
                if let Some(suggestion) = suggestion {
                    write!(f, " (suggestion: {suggestion})")?;
                }
                Ok(())
            }
            Self::InvalidUrl { detail } => write!(f, "invalid backend URL: {detail}"),
        }
    }
}

impl Error for TransportError {}

/// Transport seam used by the geocode client and the sync manager.
///
/// Implemented by the HTTP gateway in production and by in-memory stubs
/// in tests.
pub trait BackendGateway: Send + Sync {
    /// Issues one request and returns the raw 2xx response.
    ///
    /// `query` pairs are URL-encoded by the implementation. No retries.
    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
        timeout_ms: u64,
    ) -> TransportResult<GatewayResponse>;

    /// Probes `GET /api/health`; used at session start to decide whether
    /// the session runs backend-synced or local-only.
    fn health_check(&self, timeout_ms: u64) -> bool {
        self.request(Method::Get, "/api/health", &[], None, timeout_ms)
            .is_ok()
    }
}
