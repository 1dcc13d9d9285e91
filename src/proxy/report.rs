//! Per-proxy status reporting

use crate::error::ValidatorError;
use crate::proxy::models::{ProbeOutcome, ValidationJob};
use tracing::{error, info, warn};

/// Receives one report per classified job.
///
/// Called from many workers at once. A valid proxy that could not be written
/// to the sink goes to `report_unsaved` instead of `report`.
pub trait StatusReporter: Send + Sync {
    fn report(&self, job: &ValidationJob, outcome: &ProbeOutcome);

    fn report_unsaved(&self, _job: &ValidationJob, _error: &ValidatorError) {}
}

/// Writes status lines through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report(&self, job: &ValidationJob, outcome: &ProbeOutcome) {
        match outcome {
            ProbeOutcome::Valid(_) => {
                info!(line = job.line, proxy = %job.address, "valid proxy");
            }
            ProbeOutcome::Invalid(reported_ip) => {
                warn!(
                    line = job.line,
                    proxy = %job.address,
                    reported_ip = %reported_ip,
                    "invalid proxy"
                );
            }
            ProbeOutcome::ProbeError(e) => {
                warn!(line = job.line, proxy = %job.address, error = %e, "invalid proxy");
            }
        }
    }

    fn report_unsaved(&self, job: &ValidationJob, e: &ValidatorError) {
        error!(line = job.line, proxy = %job.address, error = %e, "failed to persist valid proxy");
    }
}

/// Discards every report
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl StatusReporter for SilentReporter {
    fn report(&self, _job: &ValidationJob, _outcome: &ProbeOutcome) {}
}
