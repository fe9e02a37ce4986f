use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid pair: {0}")]
    InvalidPair(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single adapter call. Recovered inside the dispatcher and
/// never surfaced to `get_snapshot` callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    #[error("Upstream returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Unsupported symbol: {0}")]
    UnsupportedSymbol(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },

    /// Upstream answered with an error code other than "unknown symbol",
    /// e.g. a rate limit. Not retried with another candidate.
    #[error("Upstream rejected request: {0}")]
    Rejected(String),
}

impl AdapterError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AdapterError::Unreachable(_) => FailureKind::UpstreamUnreachable,
            AdapterError::HttpStatus { .. } => FailureKind::UpstreamHttpError,
            AdapterError::UnsupportedSymbol(_) => FailureKind::UnsupportedSymbol,
            AdapterError::MalformedResponse(_) => FailureKind::MalformedResponse,
            AdapterError::TimedOut { .. } => FailureKind::TimedOut,
            AdapterError::Rejected(_) => FailureKind::UpstreamRejected,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UpstreamUnreachable,
    UpstreamHttpError,
    UnsupportedSymbol,
    MalformedResponse,
    TimedOut,
    UpstreamRejected,
}

impl FailureKind {
    /// Label used for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UpstreamUnreachable => "upstream_unreachable",
            FailureKind::UpstreamHttpError => "upstream_http_error",
            FailureKind::UnsupportedSymbol => "unsupported_symbol",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::TimedOut => "timed_out",
            FailureKind::UpstreamRejected => "upstream_rejected",
        }
    }
}
