//! Error types and Result aliases for diagshell

use std::path::PathBuf;

/// Result type alias for diagshell operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for diagshell
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === Session errors ===
    /// Shell endpoint missing or refusing connections
    #[error("Failed to connect to shell at '{}': {reason}", path.display())]
    ConnectionFailed { path: PathBuf, reason: String },

    /// Peer closed the stream while we were writing
    #[error("Failed to write to shell: {reason}")]
    WriteFailed { reason: String },

    /// Socket read failed for a reason other than a timeout
    #[error("Failed to read from shell: {reason}")]
    ReadFailed { reason: String },

    /// Operation attempted on a connection that was already closed
    #[error("Shell connection already closed")]
    ConnectionClosed,

    // === Configuration errors ===
    /// Failed to load configuration file
    #[error("Failed to load config from '{}': {reason}", path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Failed to save configuration file
    #[error("Failed to save config to '{}': {reason}", path.display())]
    ConfigSaveFailed { path: PathBuf, reason: String },

    /// Configuration file not found
    #[error("Configuration file not found")]
    ConfigNotFound,

    /// Configuration validation failed
    #[error("Configuration validation failed for '{field}': {reason}")]
    ConfigValidationFailed { field: String, reason: String },

    /// Failed to parse configuration
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    // === Service errors ===
    /// Broker request could not be decoded or is missing fields
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    // === I/O and serialization errors ===
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
