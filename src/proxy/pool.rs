//! Fixed-size pool of validation workers

use crate::proxy::checker::ProbeClassifier;
use crate::proxy::models::{PoolStats, ValidationJob};
use crate::proxy::report::StatusReporter;
use crate::proxy::sink::ResultSink;
use futures::future::join_all;
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc::Receiver;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Default number of concurrent workers
pub const DEFAULT_WORKERS: usize = 10;

type SharedQueue = Arc<Mutex<Receiver<ValidationJob>>>;

/// Pool of workers draining one shared job queue
#[derive(Clone)]
pub struct WorkerPool {
    classifier: ProbeClassifier,
    reporter: Arc<dyn StatusReporter>,
    size: usize,
}

impl WorkerPool {
    pub fn new(
        classifier: ProbeClassifier,
        reporter: Arc<dyn StatusReporter>,
        size: usize,
    ) -> Self {
        Self {
            classifier,
            reporter,
            size: size.max(1),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run the pool until the queue is closed and drained.
    ///
    /// Returns only after every worker has exited.
    pub async fn run<W>(&self, jobs: Receiver<ValidationJob>, sink: Arc<ResultSink<W>>) -> PoolStats
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let queue: SharedQueue = Arc::new(Mutex::new(jobs));

        let handles = (0..self.size).map(|id| {
            let worker = self.clone();
            let queue = Arc::clone(&queue);
            let sink = Arc::clone(&sink);
            tokio::spawn(async move { worker.work(id, queue, sink).await })
        });

        let mut stats = PoolStats::default();
        for result in join_all(handles).await {
            match result {
                Ok(worker_stats) => stats.merge(&worker_stats),
                Err(e) => error!(error = %e, "validation worker aborted"),
            }
        }
        stats
    }

    async fn work<W>(&self, id: usize, queue: SharedQueue, sink: Arc<ResultSink<W>>) -> PoolStats
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut stats = PoolStats::default();

        loop {
            // the lock is released as soon as one job is handed over
            let next = queue.lock().await.recv().await;
            let Some(job) = next else {
                break;
            };

            let outcome = self.classifier.classify(&job.address).await;

            let saved = if outcome.is_valid() {
                sink.append(&job.address).await
            } else {
                Ok(())
            };

            match saved {
                Ok(()) => self.reporter.report(&job, &outcome),
                Err(e) => {
                    self.reporter.report_unsaved(&job, &e);
                    stats.sink_failures += 1;
                }
            }
            stats.record(&outcome);
        }

        debug!(worker = id, classified = stats.total, "worker finished");
        stats
    }
}
