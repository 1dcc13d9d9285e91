//! Append-only destination for validated proxies

use crate::error::ValidatorError;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Shared writer for validated proxies, one address per line.
///
/// Every append writes and flushes a complete line while holding the lock, so
/// concurrent workers never interleave partial lines and nothing is left
/// buffered if the run ends early.
pub struct ResultSink<W = File> {
    writer: Mutex<W>,
}

impl ResultSink<File> {
    /// Create (or truncate) the output file.
    pub async fn create<P: AsRef<Path>>(path: P) -> Result<Self, ValidatorError> {
        let path = path.as_ref();
        let file = File::create(path)
            .await
            .map_err(|source| ValidatorError::SinkCreate {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_writer(file))
    }
}

impl<W> ResultSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Append one address as a full line.
    pub async fn append(&self, address: &str) -> Result<(), ValidatorError> {
        let mut line = String::with_capacity(address.len() + 1);
        line.push_str(address);
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|source| ValidatorError::SinkWrite { source })?;
        writer
            .flush()
            .await
            .map_err(|source| ValidatorError::SinkWrite { source })
    }

    /// Flush and shut the writer down.
    pub async fn close(self) -> Result<(), ValidatorError> {
        let mut writer = self.writer.into_inner();
        writer
            .shutdown()
            .await
            .map_err(|source| ValidatorError::SinkWrite { source })
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}
