//! Error types for proxy validation

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single probe could not produce a reported IP.
///
/// Every variant collapses to the `ProbeError` outcome for its job; none of them
/// stop the worker pool.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProbeError {
    #[error("invalid proxy address {address:?}: {reason}")]
    Parse { address: String, reason: String },

    #[error("could not build proxied client: {0}")]
    Client(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("probe timed out")]
    Timeout,

    #[error("HTTP status: {0}")]
    HttpStatus(u16),

    #[error("failed to read response body: {0}")]
    Read(String),
}

impl ProbeError {
    pub fn parse(address: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_body() || err.is_decode() {
            Self::Read(err.to_string())
        } else {
            Self::Connect(err.to_string())
        }
    }
}

/// Rejected configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("probe timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid echo endpoint {url:?}: {reason}")]
    EchoEndpoint { url: String, reason: String },
}

/// Run-level failures.
#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("cannot open proxy list {path:?}: {source}")]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed reading proxy list {path:?}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot create output file {path:?}: {source}")]
    SinkCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed writing validated proxy: {source}")]
    SinkWrite {
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("echo endpoint preflight failed: {0}")]
    Preflight(ProbeError),
}
