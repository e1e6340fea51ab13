//! Core error type for APDU exchanges
//!
//! Transport failures, framing limits and non-success status words all
//! surface through [`Error`]. Status words are never retried or reinterpreted
//! here; callers decide what a given status means for them.

use crate::response::status::StatusWord;
use crate::transport::TransportError;

/// Result type for APDU operations
pub type Result<T> = core::result::Result<T, Error>;

/// Core error type that encompasses all possible errors in the crate
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The transport failed to send a frame or receive its reply
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The card replied without a status word
    #[error("Undefined status: reply shorter than a status word")]
    UndefinedStatus,

    /// The card completed the exchange with a status other than 90 00
    #[error("Status error {0}: {desc}", desc = .0.description())]
    NonSuccessStatus(StatusWord),

    /// Reassembled response would exceed the accumulator capacity
    #[error("Buffer too small: {required} bytes required, capacity is {capacity}")]
    BufferTooSmall {
        /// Bytes needed to hold the response so far
        required: usize,
        /// Configured capacity
        capacity: usize,
    },

    /// Command data exceeds what the framing can carry
    #[error("Command data too long: {len} bytes, maximum is {max}")]
    DataTooLong {
        /// Length of the command data
        len: usize,
        /// Largest length allowed
        max: usize,
    },

    /// Expected response length cannot be encoded with the selected framing
    #[error("Invalid expected length: {0}")]
    InvalidExpectedLength(u16),

    /// Raw command bytes do not form a valid APDU
    #[error("Invalid command length: {0}")]
    InvalidCommandLength(usize),

    /// Exchange configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// The card kept answering 61 XX beyond the configured limit
    #[error("Chain limit exceeded")]
    ChainLimitExceeded,

    /// Context error with message and source error
    #[error("{context}: {source}")]
    Context {
        /// Contextual message
        context: String,
        /// Source error
        source: Box<Self>,
    },
}

impl Error {
    /// Create a new error with context information
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a new status error
    pub const fn status(sw1: u8, sw2: u8) -> Self {
        Self::NonSuccessStatus(StatusWord::new(sw1, sw2))
    }

    /// Status word carried by this error, looking through context wrappers
    pub fn status_word(&self) -> Option<StatusWord> {
        match self {
            Self::NonSuccessStatus(status) => Some(*status),
            Self::UndefinedStatus => Some(StatusWord::UNDEFINED),
            Self::Context { source, .. } => source.status_word(),
            _ => None,
        }
    }
}

/// Extension trait for Result with APDU Errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, context: S) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for core::result::Result<T, E> {
    fn context<S: Into<String>>(self, context: S) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_status() {
        let result: Result<()> = Err(Error::status(0x63, 0xC2));
        let err = result.context("Verify PIN").unwrap_err();
        assert_eq!(err.to_string(), "Verify PIN: Status error 63 C2: Counter value");
        assert_eq!(err.status_word(), Some(StatusWord::new(0x63, 0xC2)));
    }

    #[test]
    fn test_transport_error_converts() {
        let result: core::result::Result<(), TransportError> = Err(TransportError::Timeout);
        let err = result.context("Select").unwrap_err();
        assert!(matches!(
            err,
            Error::Context { ref source, .. } if **source == Error::Transport(TransportError::Timeout)
        ));
    }
}
