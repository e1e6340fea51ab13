//! BER-TLV length field
//!
//! Short form is a single byte `0x00..=0x7F`. Long form is `0x81..=0x84`
//! followed by one to four big-endian length bytes.

use bytes::BufMut;

use crate::error::{Result, TlvError};
use crate::source::ByteSource;

/// Largest length encoded in the short form
pub const SHORT_FORM_MAX: u32 = 0x7F;
/// Flag in the first length byte selecting the long form
pub const LONG_FORM_FLAG: u8 = 0x80;
/// Widest length field, first byte included
pub const MAX_LENGTH_WIDTH: u8 = 5;

/// Minimal width of the length field needed to encode `length`
pub const fn width_for(length: u32) -> u8 {
    match length {
        0..=SHORT_FORM_MAX => 1,
        0x80..=0xFF => 2,
        0x100..=0xFFFF => 3,
        0x1_0000..=0xFF_FFFF => 4,
        _ => 5,
    }
}

/// Read a length field, returning the length and the field width
pub fn read<S: ByteSource + ?Sized>(source: &mut S) -> Result<(u32, u8)> {
    let first = source.read_u8()?;
    if u32::from(first) <= SHORT_FORM_MAX {
        return Ok((u32::from(first), 1));
    }

    let count = first & !LONG_FORM_FLAG;
    if count == 0 || count >= MAX_LENGTH_WIDTH {
        return Err(TlvError::MalformedLength(first));
    }

    let mut length = 0u32;
    for _ in 0..count {
        length = (length << 8) | u32::from(source.read_u8()?);
    }
    Ok((length, count + 1))
}

/// Write `length` using a field of `width` bytes
///
/// `width` must be at least [`width_for`]`(length)`; wider fields are allowed
/// so that non-minimal encodings read from a card can be reproduced.
pub fn write<B: BufMut + ?Sized>(buf: &mut B, length: u32, width: u8) {
    let width = width.clamp(width_for(length), MAX_LENGTH_WIDTH);
    if width == 1 {
        buf.put_u8(length as u8);
        return;
    }
    let count = width - 1;
    buf.put_u8(LONG_FORM_FLAG | count);
    let bytes = length.to_be_bytes();
    buf.put_slice(&bytes[4 - count as usize..]);
}
