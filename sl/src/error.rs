//! Source error types

use thiserror::Error;

/// Errors raised by the bundled [`PassThrough`](crate::PassThrough) source
///
/// Faults travel over a broadcast channel, so every variant must be `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("write after end")]
    WriteAfterEnd,

    #[error("unshift after end event")]
    UnshiftAfterEnd,

    #[error("source destroyed")]
    Destroyed,

    #[error("{0}")]
    Fault(String),
}

impl SourceError {
    /// Build a fault carrying a caller-supplied message
    pub fn fault(message: impl Into<String>) -> Self {
        SourceError::Fault(message.into())
    }

    /// Check if this error was raised by misuse of the source rather than reported by it
    pub fn is_misuse(&self) -> bool {
        match self {
            SourceError::WriteAfterEnd => true,
            SourceError::UnshiftAfterEnd => true,
            SourceError::Destroyed => true,
            SourceError::Fault(_) => false,
        }
    }
}
