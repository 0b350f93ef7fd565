//! Error types for avpump-core.

use std::io;
use thiserror::Error;

/// Result type for avpump-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for avpump-core operations.
///
/// Every variant is fatal to the pump invocation that raised it; none
/// are retried internally. `NeedsInput` and `Eof` are control signals,
/// not errors, and never appear here.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading a source or appending to a sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid caller-supplied arguments.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Malformed bitstream reported by the unit parser.
    #[error("bitstream parse error: {0}")]
    Parse(String),

    /// Engine rejected input during the submit phase.
    #[error("submit failed: {0}")]
    Submit(String),

    /// Engine failed during the retrieve phase.
    #[error("retrieve failed: {0}")]
    Retrieve(String),

    /// Decoded output shape no longer matches the first unit's shape.
    #[error("output shape changed mid-stream: first unit was {expected}, got {got}")]
    FormatChange { expected: String, got: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
