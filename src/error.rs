//! Error types for the load balancer.

use actix_web::http::StatusCode;
use actix_web::ResponseError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LbError>;

/// Errors raised while building or serving through the pool.
#[derive(Debug, Error)]
pub enum LbError {
    /// Bad startup configuration. Fatal, `main` exits on it.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("no backends configured")]
    NoBackendsConfigured,

    /// Every backend was passed over during one bounded scan.
    #[error("no live backend after {attempts} attempts")]
    NoLiveBackend { attempts: usize },

    /// The upstream call failed: refused connection, timeout or a broken response.
    #[error("upstream {address} unreachable: {reason}")]
    UpstreamUnreachable { address: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid backend address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        source: url::ParseError,
    },

    #[error("unsupported scheme in backend address {address:?}, expected http or https")]
    UnsupportedScheme { address: String },

    #[error("backend {address:?} must have a weight of at least 1")]
    ZeroWeight { address: String },

    #[error("timeout_secs must be greater than zero")]
    ZeroTimeout,
}

impl ResponseError for LbError {
    fn status_code(&self) -> StatusCode {
        match self {
            LbError::NoBackendsConfigured | LbError::NoLiveBackend { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            LbError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            LbError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
