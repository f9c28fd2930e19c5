//! # Error Types
//!
//! Custom error types for the lander console using `thiserror`.

use std::time::Duration;
use thiserror::Error;

/// Main error type for the lander console
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Datagram send/receive failures (including short transfers)
    #[error("Transport error: {0}")]
    Transport(String),

    /// No lander reply within the bounded wait
    #[error("Timed out after {0:?} waiting for lander telemetry")]
    Timeout(Duration),

    /// A telemetry line that does not follow the `key:value` grammar
    #[error("Malformed telemetry line: {0}")]
    MalformedMessage(String),

    /// Peer or bind address that cannot be parsed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Input sampler errors
    #[error("Input error: {0}")]
    Input(String),

    /// No usable input device was found
    #[error("No input device with the configured axes was found")]
    InputDeviceNotFound,
}

impl ConsoleError {
    /// True for faults that only cost the current cycle.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConsoleError::Transport(_) | ConsoleError::Timeout(_) | ConsoleError::MalformedMessage(_)
        )
    }
}

/// Result type alias for the lander console
pub type Result<T> = std::result::Result<T, ConsoleError>;
