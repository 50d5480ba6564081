//! Test Utilities
//!
//! Simulated shell backends and fixtures shared by the integration and
//! contract tests.

#![allow(dead_code)]


// Re-exports for convenience
pub use fixtures::{fast_config, fast_settings, FAST_DRAIN, FAST_NEGOTIATE, FAST_RESPONSE};
pub use mock_shell::{MockShell, Reply};
