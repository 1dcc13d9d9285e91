//! Proxy validation data models

use crate::error::ProbeError;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Serialize;
use std::fmt;

/// A parsed proxy endpoint, `scheme://host[:port]`.
///
/// Keeps the original text so that exactly what was read is what gets persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAddress {
    raw: String,
    url: Url,
    host: String,
}

impl ProxyAddress {
    pub(crate) fn new(raw: String, url: Url, host: String) -> Self {
        Self { raw, url, host }
    }

    /// The address exactly as it appeared in the input.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed proxy URL handed to the HTTP client.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Host portion without port or IPv6 brackets.
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// One line of input on its way to exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationJob {
    /// 1-based line number in the source
    pub line: usize,
    pub address: String,
}

impl ValidationJob {
    pub fn new(line: usize, address: impl Into<String>) -> Self {
        Self {
            line,
            address: address.into(),
        }
    }
}

/// Result of validating a single proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The echo service saw the proxy's own host
    Valid(String),
    /// The probe worked but the echoed IP is someone else's
    Invalid(String),
    ProbeError(ProbeError),
}

impl ProbeOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ProbeOutcome::Valid(_))
    }

    /// The IP the echo service returned, if the probe got that far.
    pub fn reported_ip(&self) -> Option<&str> {
        match self {
            ProbeOutcome::Valid(ip) | ProbeOutcome::Invalid(ip) => Some(ip),
            ProbeOutcome::ProbeError(_) => None,
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Valid(ip) => write!(f, "valid ({})", ip),
            ProbeOutcome::Invalid(ip) => write!(f, "invalid (reported {})", ip),
            ProbeOutcome::ProbeError(e) => write!(f, "error ({})", e),
        }
    }
}

/// Counts gathered by the worker pool
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: usize,
    pub sink_failures: usize,
}

impl PoolStats {
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        self.total += 1;
        match outcome {
            ProbeOutcome::Valid(_) => self.valid += 1,
            ProbeOutcome::Invalid(_) => self.invalid += 1,
            ProbeOutcome::ProbeError(_) => self.errors += 1,
        }
    }

    /// Fold another worker's counts into this one.
    pub fn merge(&mut self, other: &PoolStats) {
        self.total += other.total;
        self.valid += other.valid;
        self.invalid += other.invalid;
        self.errors += other.errors;
        self.sink_failures += other.sink_failures;
    }
}

/// Totals for one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: usize,
    pub sink_failures: usize,
    pub enqueued: usize,
    pub feed_error: Option<String>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>, stats: PoolStats) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            total: stats.total,
            valid: stats.valid,
            invalid: stats.invalid,
            errors: stats.errors,
            sink_failures: stats.sink_failures,
            enqueued: stats.total,
            feed_error: None,
        }
    }

    pub fn with_feed_result(mut self, enqueued: usize, feed_error: Option<String>) -> Self {
        self.enqueued = enqueued;
        self.feed_error = feed_error;
        self
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Checked {} proxies in {}ms: {} valid, {} invalid, {} errors",
            self.total,
            self.elapsed().num_milliseconds(),
            self.valid,
            self.invalid,
            self.errors
        )?;
        if self.sink_failures > 0 {
            write!(f, ", {} write failures", self.sink_failures)?;
        }
        Ok(())
    }
}
