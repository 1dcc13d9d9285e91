//! Orchestrates one validation run: feed -> queue -> pool -> sink

use crate::error::ValidatorError;
use crate::proxy::checker::{HttpTransport, ProbeClassifier};
use crate::proxy::feed::feed_file;
use crate::proxy::models::RunSummary;
use crate::proxy::pool::WorkerPool;
use crate::proxy::report::StatusReporter;
use crate::proxy::sink::ResultSink;
use crate::ValidatorConfig;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Validate every proxy listed in `config.input_path` with the given classifier.
///
/// The output file is created before any job runs; failing to create it aborts
/// the run. A missing input file is not fatal: the run completes with zero jobs
/// and the reason is kept in [`RunSummary::feed_error`].
pub async fn run(
    config: &ValidatorConfig,
    classifier: ProbeClassifier,
    reporter: Arc<dyn StatusReporter>,
) -> Result<RunSummary, ValidatorError> {
    config.validate()?;
    let sink = ResultSink::create(&config.output_path).await?;
    drive(config, classifier, reporter, sink).await
}

/// Like [`run`], probing through real HTTP requests to `config.echo_endpoint`.
///
/// With `config.preflight` set, the echo endpoint is first queried without a
/// proxy and the run stops if that fails.
pub async fn run_http(
    config: &ValidatorConfig,
    reporter: Arc<dyn StatusReporter>,
) -> Result<RunSummary, ValidatorError> {
    config.validate()?;
    let transport = HttpTransport::new(config.echo_endpoint.clone(), config.probe_timeout);
    let sink = ResultSink::create(&config.output_path).await?;

    if config.preflight {
        match transport.fetch_direct().await {
            Ok(own_ip) => info!(
                echo_url = %transport.echo_url(),
                timeout_secs = transport.timeout().as_secs_f64(),
                own_ip = %own_ip,
                "echo endpoint reachable"
            ),
            Err(e) => {
                sink.close().await?;
                return Err(ValidatorError::Preflight(e));
            }
        }
    }

    drive(config, ProbeClassifier::new(transport), reporter, sink).await
}

async fn drive(
    config: &ValidatorConfig,
    classifier: ProbeClassifier,
    reporter: Arc<dyn StatusReporter>,
    sink: ResultSink,
) -> Result<RunSummary, ValidatorError> {
    let started_at = Utc::now();
    let sink = Arc::new(sink);

    let (jobs_tx, jobs_rx) = mpsc::channel(config.queue_capacity);
    let pool = WorkerPool::new(classifier, reporter, config.worker_count);

    info!(
        input = %config.input_path.display(),
        output = %config.output_path.display(),
        workers = pool.size(),
        timeout_secs = config.probe_timeout.as_secs_f64(),
        "starting proxy validation"
    );

    let feeder = tokio::spawn(feed_file(config.input_path.clone(), jobs_tx));
    let stats = pool.run(jobs_rx, Arc::clone(&sink)).await;

    // every job the feed managed to enqueue has been classified by now
    let (enqueued, feed_error) = match feeder.await {
        Ok(Ok(count)) => (count, None),
        Ok(Err(e)) => {
            error!(error = %e, "address feed stopped early");
            (stats.total, Some(e.to_string()))
        }
        Err(e) => {
            error!(error = %e, "address feed task failed");
            (stats.total, Some(e.to_string()))
        }
    };

    match Arc::try_unwrap(sink) {
        Ok(sink) => sink.close().await?,
        Err(_) => error!("result sink still shared after pool shutdown"),
    }

    let summary = RunSummary::new(started_at, stats).with_feed_result(enqueued, feed_error);
    info!(
        valid = summary.valid,
        invalid = summary.invalid,
        errors = summary.errors,
        "all proxies checked"
    );
    Ok(summary)
}
