//! Address feed: streams candidate proxies into the job queue

use crate::error::ValidatorError;
use crate::proxy::models::ValidationJob;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::Sender;
use tracing::{debug, warn};

/// Enqueue every line of `reader` as a job, in order.
///
/// Empty and malformed lines are forwarded as-is; bytes that are not UTF-8 are
/// replaced so the line still reaches a worker. Sending waits while the queue
/// is full. The sender is dropped on return, which closes the queue.
/// Returns the number of jobs enqueued.
pub async fn feed_lines<R>(mut reader: R, jobs: Sender<ValidationJob>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }

        count += 1;
        let line = String::from_utf8_lossy(&buf).into_owned();
        if jobs.send(ValidationJob::new(count, line)).await.is_err() {
            // every worker is gone; nobody left to consume
            warn!(enqueued = count - 1, "job queue closed by consumers");
            return Ok(count - 1);
        }
    }

    debug!(enqueued = count, "address feed exhausted");
    Ok(count)
}

/// Open `path` and feed it line by line.
///
/// If the file cannot be opened the queue is closed with zero jobs.
pub async fn feed_file<P: AsRef<Path>>(
    path: P,
    jobs: Sender<ValidationJob>,
) -> Result<usize, ValidatorError> {
    let path: PathBuf = path.as_ref().to_path_buf();

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(source) => {
            drop(jobs);
            return Err(ValidatorError::SourceOpen { path, source });
        }
    };

    feed_lines(BufReader::new(file), jobs)
        .await
        .map_err(|source| ValidatorError::SourceRead { path, source })
}
