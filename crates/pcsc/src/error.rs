//! Error types for PC/SC transport

use biocard_apdu_core::transport::TransportError;

/// PC/SC-specific errors
#[derive(Debug, thiserror::Error)]
pub enum PcscError {
    /// PC/SC error
    #[error("PC/SC error: {0}")]
    Pcsc(#[from] pcsc::Error),

    /// No card present in reader
    #[error("No card present in reader: {0}")]
    NoCard(String),
}

impl From<PcscError> for TransportError {
    fn from(error: PcscError) -> Self {
        match error {
            PcscError::Pcsc(pcsc::Error::Timeout) => Self::Timeout,
            PcscError::Pcsc(
                pcsc::Error::NoSmartcard | pcsc::Error::RemovedCard | pcsc::Error::ResetCard,
            )
            | PcscError::NoCard(_) => Self::Connection,
            PcscError::Pcsc(pcsc::Error::CommError | pcsc::Error::NotTransacted) => {
                Self::Transmission
            }
            other => Self::other(other.to_string()),
        }
    }
}
