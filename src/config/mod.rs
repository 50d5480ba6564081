//! Configuration management for diagshell
//!
//! Holds the shell endpoint, the three inactivity windows used by the
//! handshake, the prompt negotiation budget and read sizing. Every field has
//! a default so a partial (or missing) config file is always usable.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::session::SessionTimeouts;

/// Well-known socket the NPU shell listens on
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/ar.npu.shell";

/// Control line asking the backend to echo its prompt
pub const DEFAULT_PROMPT_REQUEST: &str = "::prompt on";

/// Byte that terminates every prompt the backend prints
pub const DEFAULT_PROMPT_MARKER: &str = ">";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the shell backend listens
    pub endpoint: EndpointConfig,

    /// Inactivity windows
    pub timeouts: TimeoutConfig,

    /// Prompt negotiation
    pub negotiation: NegotiationConfig,

    /// Per-session read behaviour
    pub session: SessionConfig,
}

impl Config {
    /// Timeouts as durations, ready for the driver
    pub fn session_timeouts(&self) -> SessionTimeouts {
        SessionTimeouts {
            drain: Duration::from_millis(self.timeouts.drain_ms),
            negotiate: Duration::from_millis(self.timeouts.negotiate_ms),
            response: Duration::from_millis(self.timeouts.response_ms),
        }
    }

    /// Configured unit selector, if any
    pub fn unit(&self) -> Option<&str> {
        self.session
            .unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }
}

/// Shell endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Unix socket path of the shell backend
    pub socket_path: PathBuf,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
        }
    }
}

/// Inactivity windows, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Quiet period that ends a drain
    pub drain_ms: u64,

    /// Inactivity window while waiting for the prompt echo
    pub negotiate_ms: u64,

    /// Inactivity window while collecting command output
    pub response_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            drain_ms: 500,
            negotiate_ms: 1000,
            response_ms: 10_000,
        }
    }
}

/// Prompt negotiation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegotiationConfig {
    /// Number of `::prompt on` attempts before falling back to an empty prompt
    pub max_attempts: u32,

    /// Marker that ends the prompt echo
    pub prompt_marker: String,

    /// Control line sent to request the prompt
    pub prompt_request: String,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            prompt_marker: DEFAULT_PROMPT_MARKER.to_string(),
            prompt_request: DEFAULT_PROMPT_REQUEST.to_string(),
        }
    }
}

/// Session read settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Bytes requested per socket read
    pub read_chunk_size: usize,

    /// Upper bound on a single captured response
    pub max_output_bytes: usize,

    /// NPU unit to select before running the command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: 2048,
            max_output_bytes: 10 * 1024 * 1024,
            unit: None,
        }
    }
}
