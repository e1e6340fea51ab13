//! Error types for TLV encoding and decoding

/// Result type for TLV operations
pub type Result<T> = core::result::Result<T, TlvError>;

/// Errors produced while decoding, building or encoding TLV trees
#[derive(Debug, thiserror::Error)]
pub enum TlvError {
    /// Tag field is wider than three bytes or its continuation bytes are inconsistent
    #[error("Malformed tag: {0}")]
    MalformedTag(&'static str),

    /// First byte of the length field uses an unsupported encoding
    #[error("Malformed length field: first byte {0:#04X}")]
    MalformedLength(u8),

    /// Contents of an object do not add up to its declared length
    #[error("TLV declares {declared} bytes but {consumed} are present")]
    TruncatedOrOverrunTlv {
        /// Length declared by the object
        declared: u32,
        /// Bytes consumed by its children, or available for its value
        consumed: u64,
    },

    /// Source ran out of bytes in the middle of an object
    #[error("Unexpected end of input: needed {needed} more bytes")]
    UnexpectedEof {
        /// Number of bytes that were requested but not available
        needed: usize,
    },

    /// Attempted to attach a child to a primitive object
    #[error("Tag {0:#X} is primitive and cannot hold children")]
    NotConstructed(u32),

    /// Attempted to set a primitive value on a constructed object
    #[error("Tag {0:#X} is constructed and cannot hold a primitive value")]
    NotPrimitive(u32),

    /// Child index out of range
    #[error("No child at index {0}")]
    NoSuchChild(usize),

    /// Value length does not fit in a 4-byte length field
    #[error("Length overflow: {0} bytes cannot be encoded")]
    LengthOverflow(u64),

    /// Constructed objects nested deeper than the decoder allows
    #[error("TLV nesting exceeds {0} levels")]
    NestingTooDeep(usize),

    /// Simple-TLV tag outside 0x01..=0xFE
    #[error("Invalid Simple-TLV tag: {0:#04X}")]
    InvalidSimpleTag(u8),

    /// I/O error from a reader-backed source
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TlvError {
    /// Create a new malformed tag error
    pub const fn malformed_tag(message: &'static str) -> Self {
        Self::MalformedTag(message)
    }

    /// Check if this error means the input ended early
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. })
    }
}
