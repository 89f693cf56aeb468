//! Error types for the UPS supervisor

use std::io;
use thiserror::Error;

/// Result type alias for supervisor operations
pub type Result<T> = std::result::Result<T, UpsError>;

/// Error type for the UPS supervisor
#[derive(Error, Debug)]
pub enum UpsError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Wiring fault detected at startup
    #[error("Wiring fault: {0}")]
    WiringFault(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Hardware error
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Command failed
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// Nix error (Unix)
    #[cfg(unix)]
    #[error("System error: {0}")]
    Nix(#[from] nix::Error),
}
