//! BER-TLV tag field
//!
//! A tag is stored as its encoded bytes packed big-endian into a `u32`,
//! together with the number of bytes the field occupies on the wire.

use core::fmt;

use bytes::BufMut;
use derive_more::Display;

use crate::error::{Result, TlvError};
use crate::source::ByteSource;

/// Mask of the class bits in the first tag byte
pub const CLASS_MASK: u8 = 0xC0;
/// Constructed flag in the first tag byte
pub const CONSTRUCTED_FLAG: u8 = 0x20;
/// Low five bits all set: the tag number continues in following bytes
pub const MULTI_BYTE_INDICATOR: u8 = 0x1F;
/// High bit of a continuation byte: another byte follows
pub const CONTINUATION_FLAG: u8 = 0x80;
/// Widest tag field this codec accepts
pub const MAX_TAG_WIDTH: u8 = 3;

/// Class of a BER-TLV tag, taken from bits 7-6 of the first tag byte
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    /// `00`
    #[display("universal")]
    Universal,
    /// `01`
    #[display("application")]
    Application,
    /// `10`
    #[display("context-specific")]
    ContextSpecific,
    /// `11`
    #[display("private")]
    Private,
}

impl TagClass {
    const fn from_first_byte(byte: u8) -> Self {
        match (byte & CLASS_MASK) >> 6 {
            0 => Self::Universal,
            1 => Self::Application,
            2 => Self::ContextSpecific,
            _ => Self::Private,
        }
    }
}

/// Encoded BER-TLV tag (1 to 3 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    raw: u32,
    width: u8,
}

impl Tag {
    /// Build a tag from its encoded bytes packed big-endian, e.g. `0x7F61`
    ///
    /// The width is derived from the value and the continuation structure is
    /// checked, so `0x1F` on its own or `0x7F81` are rejected.
    pub fn new(raw: u32) -> Result<Self> {
        let width = match raw {
            0..=0xFF => 1,
            0x100..=0xFFFF => 2,
            0x1_0000..=0xFF_FFFF => 3,
            _ => return Err(TlvError::malformed_tag("tag wider than three bytes")),
        };
        let tag = Self { raw, width };
        tag.validate()?;
        Ok(tag)
    }

    /// Tag from a single byte, which must not announce continuation bytes
    pub fn single(byte: u8) -> Result<Self> {
        Self::new(u32::from(byte))
    }

    fn validate(&self) -> Result<()> {
        let bytes = self.to_be_bytes();
        let bytes = &bytes[4 - self.width as usize..];
        let multi = bytes[0] & MULTI_BYTE_INDICATOR == MULTI_BYTE_INDICATOR;
        match (multi, bytes.len()) {
            (false, 1) => Ok(()),
            (false, _) => Err(TlvError::malformed_tag(
                "continuation bytes without multi-byte indicator",
            )),
            (true, 1) => Err(TlvError::malformed_tag("missing continuation byte")),
            (true, _) => {
                let Some((last, middle)) = bytes[1..].split_last() else {
                    return Err(TlvError::malformed_tag("missing continuation byte"));
                };
                if middle.iter().any(|b| b & CONTINUATION_FLAG == 0) {
                    return Err(TlvError::malformed_tag("continuation terminated early"));
                }
                if last & CONTINUATION_FLAG != 0 {
                    return Err(TlvError::malformed_tag("tag wider than three bytes"));
                }
                Ok(())
            }
        }
    }

    /// Read a tag field from a byte source
    pub fn read<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self> {
        let first = source.read_u8()?;
        let mut raw = u32::from(first);
        let mut width = 1u8;

        if first & MULTI_BYTE_INDICATOR == MULTI_BYTE_INDICATOR {
            loop {
                if width == MAX_TAG_WIDTH {
                    return Err(TlvError::malformed_tag("tag wider than three bytes"));
                }
                let next = source.read_u8()?;
                raw = (raw << 8) | u32::from(next);
                width += 1;
                if next & CONTINUATION_FLAG == 0 {
                    break;
                }
            }
        }

        Ok(Self { raw, width })
    }

    /// Write the tag field
    pub fn write<B: BufMut + ?Sized>(&self, buf: &mut B) {
        let bytes = self.to_be_bytes();
        buf.put_slice(&bytes[4 - self.width as usize..]);
    }

    const fn to_be_bytes(self) -> [u8; 4] {
        self.raw.to_be_bytes()
    }

    const fn first_byte(&self) -> u8 {
        (self.raw >> ((self.width as u32 - 1) * 8)) as u8
    }

    /// Encoded tag value, e.g. `0x7F61`
    pub const fn raw(&self) -> u32 {
        self.raw
    }

    /// Number of bytes in the tag field
    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Tag class
    pub const fn class(&self) -> TagClass {
        TagClass::from_first_byte(self.first_byte())
    }

    /// Whether the value holds nested TLV objects
    pub const fn is_constructed(&self) -> bool {
        self.first_byte() & CONSTRUCTED_FLAG != 0
    }

    /// Tag number: the low five bits for single-byte tags, otherwise seven
    /// bits from each continuation byte
    pub const fn number(&self) -> u32 {
        if self.width == 1 {
            return self.raw & MULTI_BYTE_INDICATOR as u32;
        }
        let mut number = 0u32;
        let mut index = self.width - 1;
        while index > 0 {
            let byte = (self.raw >> ((index as u32 - 1) * 8)) as u8;
            number = (number << 7) | (byte & !CONTINUATION_FLAG) as u32;
            index -= 1;
        }
        number
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tag")
            .field("raw", &format!("{:#X}", self.raw))
            .field("class", &self.class())
            .field("constructed", &self.is_constructed())
            .field("number", &self.number())
            .finish()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:0width$X}", self.raw, width = self.width as usize * 2)
    }
}

impl TryFrom<u32> for Tag {
    type Error = TlvError;

    fn try_from(raw: u32) -> Result<Self> {
        Self::new(raw)
    }
}
