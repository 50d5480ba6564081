//! Shell Session Transport
//!
//! Byte-level access to the shell backend's local stream socket: connect,
//! drain stale output, read until a marker or an inactivity gap, write a
//! line, close. The driver only sees the [`SessionTransport`] trait so the
//! handshake can be exercised against scripted transports.

pub mod buffer;
pub mod connection;

use crate::error::Result;
use std::time::Duration;

// Re-exports for convenience
pub use buffer::{find_marker, OutputBuffer};
pub use connection::UnixConnection;

/// The three inactivity windows used during one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// Quiet period that ends a drain
    pub drain: Duration,
    /// Window while waiting for the prompt echo
    pub negotiate: Duration,
    /// Window while collecting command output
    pub response: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            drain: Duration::from_millis(500),
            negotiate: Duration::from_secs(1),
            response: Duration::from_secs(10),
        }
    }
}

/// Byte-stream primitives the command driver needs
#[async_trait::async_trait]
pub trait SessionTransport: Send {
    /// Read and discard until one wait of `quiet_period` sees no data.
    /// Returns the number of bytes thrown away.
    async fn drain(&mut self, quiet_period: Duration) -> Result<usize>;

    /// Accumulate output until `marker` appears or a single wait of
    /// `timeout` sees no data. The timer restarts after every read.
    async fn read_until(&mut self, timeout: Duration, marker: Option<&[u8]>) -> Result<Vec<u8>>;

    /// Write `text` followed by a newline
    async fn write_line(&mut self, text: &str) -> Result<()>;

    /// Release the connection
    async fn close(&mut self) -> Result<()>;
}
