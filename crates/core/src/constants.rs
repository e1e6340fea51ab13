//! ISO/IEC 7816-4 constants used when framing commands

/// Class bytes
pub mod cla {
    /// Interindustry class, no secure messaging, basic channel
    pub const ISO: u8 = 0x00;
    /// Command chaining indicator, set on all but the last chained frame
    pub const CHAINING: u8 = 0x10;
    /// Proprietary class used by SET CONTACT MODE
    pub const PROPRIETARY: u8 = 0xC0;
}

/// Instruction bytes
pub mod ins {
    /// SELECT
    pub const SELECT: u8 = 0xA4;
    /// VERIFY (reference data such as a PIN)
    pub const VERIFY: u8 = 0x20;
    /// VERIFY with biometric data, used for match-on-card
    pub const VERIFY_BIOMETRIC: u8 = 0x21;
    /// RESET RETRY COUNTER
    pub const RESET_RETRY_COUNTER: u8 = 0x2C;
    /// GET DATA
    pub const GET_DATA: u8 = 0xCB;
    /// PUT DATA
    pub const PUT_DATA: u8 = 0xDB;
    /// GET RESPONSE
    pub const GET_RESPONSE: u8 = 0xC0;
    /// SET CONTACT MODE (proprietary)
    pub const SET_CONTACT_MODE: u8 = 0x17;
}

/// Frame size limits
pub mod limits {
    /// CLA INS P1 P2
    pub const HEADER_LEN: usize = 4;
    /// SW1 SW2
    pub const TRAILER_LEN: usize = 2;
    /// Largest Lc in a short frame
    pub const MAX_SHORT_LC: usize = 255;
    /// Largest Le written literally in a short frame; 256 is encoded as 00
    pub const MAX_SHORT_LE: u16 = 255;
    /// Largest command data length in an extended frame
    pub const MAX_DATA_LEN: usize = 0xFFFF;
    /// Length of a padded PIN block
    pub const PIN_LENGTH: usize = 8;
    /// Byte used to pad a PIN block
    pub const PIN_PAD: u8 = 0xFF;
}
