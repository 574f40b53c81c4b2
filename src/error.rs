//! Error types for the AGI client.

use crate::response::ReturnStatus;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type AgiResult<T> = Result<T, AgiError>;

/// Main error type for all AGI operations.
///
/// Every failure surfaces to the immediate caller; the client performs no
/// retries and no silent recovery.
#[derive(Debug, Error)]
pub enum AgiError {
    /// The engine answered with a non-success status code, the response
    /// carried no extractable result, or the decoded result is the
    /// command's documented failure value.
    #[error("command failed: {status}")]
    CommandFailed {
        /// Full decoded status of the failed cycle.
        status: ReturnStatus,
    },

    /// The engine closed its read side while a command was being written.
    /// The call leg is gone; treat as call termination, not as a protocol
    /// fault.
    #[error("channel hung up during command execution")]
    Hangup,

    /// An argument was rejected before any bytes were sent.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the argument.
        message: String,
    },

    /// Any other transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgiError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        AgiError::InvalidArgument {
            message: message.into(),
        }
    }
}
