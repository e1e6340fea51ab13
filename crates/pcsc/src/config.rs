//! Configuration options for PC/SC transport

use biocard_apdu_core::FramingMode;
use pcsc::{Protocol, Protocols as PcscProtocols, ShareMode as PcscShareMode};

/// Sharing mode for card connections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShareMode {
    /// Exclusive access to the card (default)
    #[default]
    Exclusive,
    /// Shared access to the card
    Shared,
    /// Direct connection to the reader
    Direct,
}

impl From<ShareMode> for PcscShareMode {
    fn from(mode: ShareMode) -> Self {
        match mode {
            ShareMode::Exclusive => Self::Exclusive,
            ShareMode::Shared => Self::Shared,
            ShareMode::Direct => Self::Direct,
        }
    }
}

/// Configuration options for PC/SC transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcscConfig {
    /// Sharing mode for card connections
    pub share_mode: ShareMode,

    /// Preferred protocols for card communication
    pub protocols: PcscProtocols,

    /// Reconnect once and retry when the card reports a reset
    pub auto_reconnect: bool,
}

impl Default for PcscConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PcscConfig {
    /// Create a new default configuration
    pub const fn new() -> Self {
        Self {
            share_mode: ShareMode::Exclusive,
            protocols: PcscProtocols::ANY,
            auto_reconnect: true,
        }
    }

    /// Set the sharing mode
    pub const fn with_share_mode(mut self, mode: ShareMode) -> Self {
        self.share_mode = mode;
        self
    }

    /// Set the preferred protocols
    pub const fn with_protocols(mut self, protocols: PcscProtocols) -> Self {
        self.protocols = protocols;
        self
    }

    /// Set whether to automatically reconnect
    pub const fn with_auto_reconnect(mut self, auto_reconnect: bool) -> Self {
        self.auto_reconnect = auto_reconnect;
        self
    }
}

/// Framing suited to a negotiated protocol
///
/// T=0 cannot carry extended lengths, so commands are chained; T=1 takes
/// extended frames.
pub const fn framing_for(protocol: Option<Protocol>) -> FramingMode {
    match protocol {
        Some(Protocol::T0) => FramingMode::Chained,
        Some(Protocol::T1) => FramingMode::Extended,
        _ => FramingMode::Auto,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PcscConfig::default();
        assert_eq!(config.share_mode, ShareMode::Exclusive);
        assert_eq!(config.protocols, PcscProtocols::ANY);
        assert!(config.auto_reconnect);
    }

    #[test]
    fn test_config_builder() {
        let config = PcscConfig::new()
            .with_share_mode(ShareMode::Shared)
            .with_protocols(PcscProtocols::T1)
            .with_auto_reconnect(false);
        assert_eq!(config.share_mode, ShareMode::Shared);
        assert_eq!(config.protocols, PcscProtocols::T1);
        assert!(!config.auto_reconnect);
    }

    #[test]
    fn test_framing_for_protocol() {
        assert_eq!(framing_for(Some(Protocol::T0)), FramingMode::Chained);
        assert_eq!(framing_for(Some(Protocol::T1)), FramingMode::Extended);
        assert_eq!(framing_for(Some(Protocol::RAW)), FramingMode::Auto);
        assert_eq!(framing_for(None), FramingMode::Auto);
    }
}
