//! Exchange configuration

use derive_more::Display;

use crate::constants::limits::MAX_SHORT_LC;
use crate::{Error, Result};

/// Default capacity of the response accumulator (1 MiB)
pub const DEFAULT_MAX_RESPONSE_LEN: usize = 1 << 20;

/// Default upper bound on GET RESPONSE round trips per exchange
pub const DEFAULT_MAX_RESPONSE_CHAINS: usize = 4096;

/// How commands are split into physical frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
pub enum FramingMode {
    /// Extended fields when Lc or Le exceeds 255, short chained frames otherwise
    #[default]
    Auto,
    /// Short frames only, chaining large data (T=0 links)
    Chained,
    /// One frame per command, extended fields when needed (T=1 links)
    Extended,
}

/// Configuration for a [`CardExecutor`](crate::executor::CardExecutor)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Framing mode
    pub framing: FramingMode,
    /// Data bytes per chained frame; derived from the command when `None`
    pub max_short_lc: Option<usize>,
    /// Capacity of the response accumulator
    pub max_response_len: usize,
    /// Maximum GET RESPONSE round trips in one exchange
    pub max_response_chains: usize,
    /// Render frames without transmitting them
    pub dry_run: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeConfig {
    /// Create the default configuration
    pub const fn new() -> Self {
        Self {
            framing: FramingMode::Auto,
            max_short_lc: None,
            max_response_len: DEFAULT_MAX_RESPONSE_LEN,
            max_response_chains: DEFAULT_MAX_RESPONSE_CHAINS,
            dry_run: false,
        }
    }

    /// Set the framing mode
    pub const fn with_framing(mut self, framing: FramingMode) -> Self {
        self.framing = framing;
        self
    }

    /// Fix the number of data bytes per chained frame
    pub const fn with_max_short_lc(mut self, max_short_lc: usize) -> Self {
        self.max_short_lc = Some(max_short_lc);
        self
    }

    /// Set the response accumulator capacity
    pub const fn with_max_response_len(mut self, max_response_len: usize) -> Self {
        self.max_response_len = max_response_len;
        self
    }

    /// Set the GET RESPONSE round-trip limit
    pub const fn with_max_response_chains(mut self, max_response_chains: usize) -> Self {
        self.max_response_chains = max_response_chains;
        self
    }

    /// Enable or disable dry-run rendering
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check the configuration for values no exchange could satisfy
    pub const fn validate(&self) -> Result<()> {
        match self.max_short_lc {
            Some(lc) if lc == 0 || lc > MAX_SHORT_LC => {
                return Err(Error::InvalidConfig("max_short_lc must be within 1..=255"));
            }
            _ => {}
        }
        if self.max_response_len == 0 {
            return Err(Error::InvalidConfig("max_response_len must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExchangeConfig::default();
        assert_eq!(config.framing, FramingMode::Auto);
        assert_eq!(config.max_short_lc, None);
        assert_eq!(config.max_response_len, DEFAULT_MAX_RESPONSE_LEN);
        assert!(!config.dry_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ExchangeConfig::new()
            .with_framing(FramingMode::Chained)
            .with_max_short_lc(249)
            .with_max_response_chains(8)
            .with_dry_run(true);
        assert_eq!(config.framing.to_string(), "Chained");
        assert_eq!(config.max_short_lc, Some(249));
        assert_eq!(config.max_response_chains, 8);
        assert!(config.dry_run);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            ExchangeConfig::new().with_max_short_lc(0).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ExchangeConfig::new().with_max_short_lc(256).validate(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            ExchangeConfig::new().with_max_response_len(0).validate(),
            Err(Error::InvalidConfig(_))
        ));
    }
}
