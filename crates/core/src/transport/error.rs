//! Error types specific to card transport

/// Transport error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection error
    #[error("Failed to connect to device")]
    Connection,

    /// Transmission error
    #[error("Failed to transmit data")]
    Transmission,

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a general other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(TransportError::Connection.to_string(), "Failed to connect to device");
        assert_eq!(TransportError::Timeout.to_string(), "Operation timed out");
        assert_eq!(
            TransportError::other("Reader unplugged"),
            TransportError::Other("Reader unplugged".into())
        );
        assert_eq!(TransportError::other("Reader unplugged").to_string(), "Reader unplugged");
    }
}
