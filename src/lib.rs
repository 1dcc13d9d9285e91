//! IP Proxy Check - concurrent HTTP proxy validator
//!
//! Sends one request through each candidate proxy to an IP echo service and keeps
//! the proxies whose reported IP matches their own host.

pub mod error;
pub mod logging;
pub mod proxy;

pub use error::{ConfigError, ProbeError, ValidatorError};
pub use proxy::*;

use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

/// Application result type
pub type Result<T> = anyhow::Result<T>;

/// Default bounded queue size between the feed and the workers
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Application configuration
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Line-delimited list of candidate proxies
    pub input_path: PathBuf,
    /// Where validated proxies are written (truncated each run)
    pub output_path: PathBuf,
    /// Number of concurrent workers
    pub worker_count: usize,
    /// Timeout for each probe
    pub probe_timeout: Duration,
    /// IP echo service URL
    pub echo_endpoint: String,
    pub queue_capacity: usize,
    /// Check the echo endpoint directly before validating
    pub preflight: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("res.txt"),
            output_path: PathBuf::from("success.txt"),
            worker_count: proxy::pool::DEFAULT_WORKERS,
            probe_timeout: Duration::from_secs(proxy::checker::DEFAULT_TIMEOUT_SECS),
            echo_endpoint: proxy::checker::DEFAULT_ECHO_URL.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            preflight: false,
        }
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = path.into();
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_echo_endpoint(mut self, url: impl Into<String>) -> Self {
        self.echo_endpoint = url.into();
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_preflight(mut self, preflight: bool) -> Self {
        self.preflight = preflight;
        self
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let endpoint_error = |reason: String| ConfigError::EchoEndpoint {
            url: self.echo_endpoint.clone(),
            reason,
        };
        let url = Url::parse(&self.echo_endpoint).map_err(|e| endpoint_error(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(endpoint_error(format!("unsupported scheme {}", url.scheme())));
        }
        Ok(())
    }
}
