//! diagshell - client for the switch NPU diagnostic shell
//!
//! The NPU shell is a long-running process listening on a local Unix
//! socket. It has no framing: it prints text and, when ready for more,
//! prints its prompt. This crate connects, negotiates that prompt, sends
//! one command and returns everything the shell printed up to the next
//! prompt.
//!
//! ## Module Organization
//!
//! - [`session`] - Socket transport: drain, read-until-marker, write, close
//! - [`driver`] - Prompt negotiation and the command/response cycle
//! - [`client`] - Fresh connection per command, error reporting boundary
//! - [`service`] - Broker-facing handler and its JSON line bridge
//! - [`config`] - TOML configuration and loader
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use diagshell::{Config, ShellClient};
//!
//! # async fn example() {
//! let client = ShellClient::new(Config::default());
//! let output = client.run("show version").await;
//! println!("{}", output);
//! # }
//! ```
//!
//! ## Timing
//!
//! Every wait is an inactivity window, restarted by each read: 0.5s to
//! decide stale output is drained, 1s for the prompt echo, 10s between
//! chunks of command output. All three are configurable.

#[macro_use]
extern crate tracing;

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod service;
pub mod session;

// Re-exports for core functionality
pub use client::ShellClient;
pub use config::loader::ConfigLoader;
pub use config::Config;
pub use driver::{CommandDriver, DriverSettings, NegotiationOutcome, Prompt};
pub use error::{Error, Result};
pub use session::{SessionTimeouts, SessionTransport, UnixConnection};

/// The current version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The package name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Run one command against the endpoint in `config`.
///
/// Failures are logged and produce an empty string.
pub async fn run_shell_command(config: &Config, command: &str) -> String {
    ShellClient::new(config.clone()).run(command).await
}
