//! Unix socket connection to the shell backend
//!
//! Inactivity timeouts are implemented by bounding each individual read with
//! `tokio::time::timeout`; a read that completes restarts the window simply
//! because the next read gets a fresh one.

use super::buffer::OutputBuffer;
use super::SessionTransport;
use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

/// Default bytes requested per read
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// Default cap on a single captured response (10MB)
pub const DEFAULT_MAX_OUTPUT: usize = 10 * 1024 * 1024;

/// Outcome of one bounded read
enum ChunkRead {
    Data(Vec<u8>),
    Idle,
    Eof,
}

/// Exclusively owned stream connection to the shell backend
#[derive(Debug)]
pub struct UnixConnection {
    stream: Option<UnixStream>,
    path: PathBuf,
    chunk_size: usize,
    max_output: usize,
}

impl UnixConnection {
    /// Connect to the backend listening on `path`
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| Error::ConnectionFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        debug!("Connected to shell at {}", path.display());

        Ok(Self {
            stream: Some(stream),
            path: path.to_path_buf(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_output: DEFAULT_MAX_OUTPUT,
        })
    }

    /// Override read sizing
    pub fn with_limits(mut self, chunk_size: usize, max_output: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self.max_output = max_output.max(self.chunk_size);
        self
    }

    /// Socket path this connection was opened on
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `close` has not been called yet
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Wait up to `wait` for one chunk of data
    async fn read_chunk(&mut self, wait: Duration) -> Result<ChunkRead> {
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
        let mut buf = vec![0u8; self.chunk_size];

        loop {
            match timeout(wait, stream.read(&mut buf)).await {
                Err(_) => return Ok(ChunkRead::Idle),
                Ok(Ok(0)) => return Ok(ChunkRead::Eof),
                Ok(Ok(n)) => {
                    buf.truncate(n);
                    return Ok(ChunkRead::Data(buf));
                }
                Ok(Err(e)) if e.kind() == ErrorKind::Interrupted => continue,
                Ok(Err(e)) => {
                    return Err(Error::ReadFailed {
                        reason: e.to_string(),
                    })
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl SessionTransport for UnixConnection {
    async fn drain(&mut self, quiet_period: Duration) -> Result<usize> {
        let mut discarded = 0;
        loop {
            match self.read_chunk(quiet_period).await? {
                ChunkRead::Data(bytes) => discarded += bytes.len(),
                ChunkRead::Idle => break,
                ChunkRead::Eof => {
                    debug!("Shell closed the stream while draining");
                    break;
                }
            }
        }

        if discarded > 0 {
            trace!("Drained {} stale bytes", discarded);
        }
        Ok(discarded)
    }

    async fn read_until(&mut self, timeout: Duration, marker: Option<&[u8]>) -> Result<Vec<u8>> {
        let mut buffer = OutputBuffer::new(self.max_output);

        loop {
            match self.read_chunk(timeout).await? {
                ChunkRead::Data(bytes) => {
                    if buffer.push(&bytes, marker) {
                        break;
                    }
                    if buffer.is_full() {
                        let dropped = if buffer.was_truncated() {
                            ", rest of the last chunk dropped"
                        } else {
                            ""
                        };
                        warn!(
                            "Output limit of {} bytes reached{}, returning partial output",
                            self.max_output, dropped
                        );
                        break;
                    }
                }
                ChunkRead::Idle => {
                    if marker.is_some() {
                        debug!(
                            "No data for {:?} before marker, returning {} bytes",
                            timeout,
                            buffer.len()
                        );
                    }
                    break;
                }
                ChunkRead::Eof => {
                    debug!("Shell closed the stream after {} bytes", buffer.len());
                    break;
                }
            }
        }

        Ok(buffer.into_inner())
    }

    async fn write_line(&mut self, text: &str) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;

        let mut line = Vec::with_capacity(text.len() + 1);
        line.extend_from_slice(text.as_bytes());
        line.push(b'\n');

        stream
            .write_all(&line)
            .await
            .map_err(|e| Error::WriteFailed {
                reason: e.to_string(),
            })?;
        stream.flush().await.map_err(|e| Error::WriteFailed {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            // The peer may already be gone; the descriptor is released on drop either way
            if let Err(e) = stream.shutdown().await {
                debug!("Shutdown of {} failed: {}", self.path.display(), e);
            }
            debug!("Closed shell connection {}", self.path.display());
        }
        Ok(())
    }
}
