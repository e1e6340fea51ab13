//! Status words closing every card reply
//!
//! Only the words the exchange layer itself acts on get helpers: `90 00`,
//! the `61 XX` continuation, `6C XX` (wrong Le), the `63 CX` retry counter
//! and the `FF FF` marker for replies without a trailer. Everything else is
//! reported to the caller with a description and left for it to interpret.

use std::fmt;

use tracing::Level;

/// Byte used for both halves of [`StatusWord::UNDEFINED`]
pub const UNDEFINED_STATUS_BYTE: u8 = 0xFF;

const SW1_MORE_DATA: u8 = 0x61;
const SW1_NVM_CHANGED: u8 = 0x63;
const SW1_WRONG_LE: u8 = 0x6C;
const COUNTER_NIBBLE: u8 = 0xC0;

/// Status word (SW1 SW2) ending a card reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord {
    /// First status byte
    pub sw1: u8,
    /// Second status byte
    pub sw2: u8,
}

impl StatusWord {
    /// Normal completion (90 00)
    pub const SUCCESS: Self = Self::new(0x90, 0x00);

    /// Reported when a reply is too short to carry a status word (FF FF)
    pub const UNDEFINED: Self = Self::new(UNDEFINED_STATUS_BYTE, UNDEFINED_STATUS_BYTE);

    /// Create a status word from its two bytes
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Check for normal completion
    pub const fn is_success(&self) -> bool {
        self.sw1 == Self::SUCCESS.sw1 && self.sw2 == Self::SUCCESS.sw2
    }

    /// Check whether the card holds more response data (61 XX)
    pub const fn is_more_data_available(&self) -> bool {
        self.sw1 == SW1_MORE_DATA
    }

    /// SW2 of a 61 XX status, the Le for the next GET RESPONSE
    pub const fn remaining_bytes(&self) -> Option<u8> {
        if self.is_more_data_available() { Some(self.sw2) } else { None }
    }

    /// Byte count announced by a 61 XX status, with 00 read as 256
    pub const fn get_response_length(&self) -> Option<u16> {
        match self.remaining_bytes() {
            Some(0) => Some(256),
            Some(n) => Some(n as u16),
            None => None,
        }
    }

    /// Le the card asks for after a 6C XX status, with 00 read as 256
    pub const fn exact_length(&self) -> Option<u16> {
        match (self.sw1, self.sw2) {
            (SW1_WRONG_LE, 0) => Some(256),
            (SW1_WRONG_LE, n) => Some(n as u16),
            _ => None,
        }
    }

    /// Check for a warning that changed non-volatile memory (63 XX)
    pub const fn is_warning_nvm_changed(&self) -> bool {
        self.sw1 == SW1_NVM_CHANGED
    }

    /// Retries left, from a 63 CX status
    pub const fn retry_counter(&self) -> Option<u8> {
        if self.sw1 == SW1_NVM_CHANGED && self.sw2 & 0xF0 == COUNTER_NIBBLE {
            Some(self.sw2 & 0x0F)
        } else {
            None
        }
    }

    /// Check whether the reply carried no status word
    pub const fn is_undefined(&self) -> bool {
        self.sw1 == UNDEFINED_STATUS_BYTE && self.sw2 == UNDEFINED_STATUS_BYTE
    }

    /// Level at which to log this status
    ///
    /// Completion and continuation are routine, 62 XX and 63 XX warnings are
    /// informational, everything else is a failure.
    pub const fn tracing_level(&self) -> Level {
        match self.sw1 {
            _ if self.is_success() => Level::DEBUG,
            SW1_MORE_DATA => Level::DEBUG,
            0x62 | SW1_NVM_CHANGED => Level::INFO,
            _ => Level::WARN,
        }
    }

    /// Short description for logs and error messages
    pub const fn description(&self) -> &'static str {
        match (self.sw1, self.sw2) {
            (0x90, 0x00) => "Success",
            (UNDEFINED_STATUS_BYTE, UNDEFINED_STATUS_BYTE) => "Undefined status",
            (SW1_MORE_DATA, _) => "More data available",
            (SW1_NVM_CHANGED, n) if n & 0xF0 == COUNTER_NIBBLE => "Counter value",
            (0x62, _) => "Warning, memory unchanged",
            (SW1_NVM_CHANGED, _) => "Warning, memory changed",
            (0x67, 0x00) => "Wrong length",
            (0x69, 0x82) => "Security status not satisfied",
            (0x69, 0x83) => "Authentication method blocked",
            (0x69, 0x85) => "Conditions of use not satisfied",
            (0x6A, 0x80) => "Incorrect parameters in the data field",
            (0x6A, 0x82) => "File or application not found",
            (0x6A, 0x86) => "Incorrect parameters P1-P2",
            (0x6A, 0x88) => "Referenced data not found",
            (SW1_WRONG_LE, _) => "Wrong Le field",
            (0x6D, 0x00) => "Instruction code not supported or invalid",
            (0x6E, 0x00) => "Class not supported",
            _ => "Unknown status word",
        }
    }
}

impl From<(u8, u8)> for StatusWord {
    fn from((sw1, sw2): (u8, u8)) -> Self {
        Self::new(sw1, sw2)
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {:02X}", self.sw1, self.sw2)
    }
}
