//! Proxy validation pipeline
//!
//! This module provides:
//! - Parsing proxy addresses and echo service responses
//! - Classifying a proxy with a single probe through it
//! - Streaming candidates into a bounded queue drained by a fixed worker pool
//! - Persisting validated proxies to a shared append-only sink

pub mod checker;
pub mod feed;
pub mod models;
pub mod parser;
pub mod pool;
pub mod report;
pub mod runner;
pub mod sink;

pub use checker::{judge, EchoTransport, HttpTransport, ProbeClassifier};
pub use feed::{feed_file, feed_lines};
pub use models::{PoolStats, ProbeOutcome, ProxyAddress, RunSummary, ValidationJob};
pub use parser::ProxyParser;
pub use pool::WorkerPool;
pub use report::{LogReporter, SilentReporter, StatusReporter};
pub use runner::{run, run_http};
pub use sink::ResultSink;
