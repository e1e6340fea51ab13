//! Simple-TLV (ISO/IEC 7816-4 section 5.2.1)
//!
//! One tag byte in `0x01..=0xFE`, then either one length byte `0x00..=0xFE`
//! or `0xFF` followed by two big-endian length bytes. Values are flat.
//!
//! Objects are backed by [`iso7816_tlv::simple::Tlv`]; this module adds
//! streaming reads from a [`ByteSource`] and typed errors.

use bytes::{BufMut, Bytes};
use iso7816_tlv::simple::{Tag, Tlv};

use crate::error::{Result, TlvError};
use crate::source::ByteSource;

/// Length byte announcing a two-byte length
const THREE_BYTE_LENGTH: u8 = 0xFF;
/// Longest value a Simple-TLV object can carry
pub const MAX_SIMPLE_LENGTH: usize = 0xFFFF;

/// One Simple-TLV data object
#[derive(Debug, Clone)]
pub struct SimpleTlv {
    inner: Tlv,
}

impl PartialEq for SimpleTlv {
    fn eq(&self, other: &Self) -> bool {
        self.tag() == other.tag() && self.value() == other.value()
    }
}

impl Eq for SimpleTlv {}

fn check_tag(tag: u8) -> Result<Tag> {
    Tag::try_from(tag).map_err(|_| TlvError::InvalidSimpleTag(tag))
}

impl SimpleTlv {
    /// Create an object, checking the tag range and value size
    pub fn new(tag: u8, value: impl Into<Vec<u8>>) -> Result<Self> {
        Self::from_parts(check_tag(tag)?, value.into())
    }

    fn from_parts(tag: Tag, value: Vec<u8>) -> Result<Self> {
        let len = value.len();
        if len > MAX_SIMPLE_LENGTH {
            return Err(TlvError::LengthOverflow(len as u64));
        }
        let inner = Tlv::new(tag, value).map_err(|_| TlvError::LengthOverflow(len as u64))?;
        Ok(Self { inner })
    }

    /// Tag byte
    pub fn tag(&self) -> u8 {
        self.inner.tag().into()
    }

    /// Value bytes
    pub fn value(&self) -> &[u8] {
        self.inner.value()
    }

    /// Width of the length field: 1 or 3
    pub fn length_width(&self) -> usize {
        if self.value().len() < usize::from(THREE_BYTE_LENGTH) { 1 } else { 3 }
    }

    /// Total encoded size
    pub fn encoded_len(&self) -> usize {
        1 + self.length_width() + self.value().len()
    }

    /// Read one object from a streaming source
    pub fn read<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self> {
        let tag = check_tag(source.read_u8()?)?;
        let length = match source.read_u8()? {
            THREE_BYTE_LENGTH => {
                let mut field = [0u8; 2];
                source.read_into(&mut field)?;
                usize::from(u16::from_be_bytes(field))
            }
            short => usize::from(short),
        };
        let value = source.read_bytes(length)?;
        Self::from_parts(tag, value.to_vec())
    }

    /// Parse one object from the front of `data`, returning the rest
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8])> {
        let (result, rest) = Tlv::parse(data);
        let inner = result.map_err(|_| parse_error(data))?;
        Ok((Self { inner }, rest))
    }

    /// Append the encoding to `buf`
    pub fn write<B: BufMut + ?Sized>(&self, buf: &mut B) {
        buf.put_slice(&self.inner.to_vec());
    }

    /// Encode into a new buffer
    pub fn to_bytes(&self) -> Bytes {
        Bytes::from(self.inner.to_vec())
    }
}

/// Classify a rejected object by inspecting its header
fn parse_error(data: &[u8]) -> TlvError {
    let truncated = |declared: u32, value: &[u8]| TlvError::TruncatedOrOverrunTlv {
        declared,
        consumed: value.len() as u64,
    };

    match data {
        [tag, ..] if Tag::try_from(*tag).is_err() => TlvError::InvalidSimpleTag(*tag),
        [_, THREE_BYTE_LENGTH, hi, lo, value @ ..] => {
            truncated(u32::from(u16::from_be_bytes([*hi, *lo])), value)
        }
        [_, THREE_BYTE_LENGTH, field @ ..] => TlvError::UnexpectedEof {
            needed: 2 - field.len(),
        },
        [_, length, value @ ..] => truncated(u32::from(*length), value),
        _ => TlvError::UnexpectedEof {
            needed: 2 - data.len(),
        },
    }
}

/// Decode consecutive Simple-TLV objects covering all of `data`
///
/// Unlike [`Tlv::parse_all`], a malformed or truncated object is an error
/// rather than the end of the list.
pub fn decode_all(data: &[u8]) -> Result<Vec<SimpleTlv>> {
    let mut objects = Vec::new();
    let mut remaining = data;
    while !remaining.is_empty() {
        let (object, rest) = SimpleTlv::parse(remaining)?;
        objects.push(object);
        remaining = rest;
    }
    Ok(objects)
}

/// Decode consecutive Simple-TLV objects until the source is exhausted
pub fn read_all<S: ByteSource + ?Sized>(source: &mut S) -> Result<Vec<SimpleTlv>> {
    let mut objects = Vec::new();
    while !source.is_exhausted()? {
        objects.push(SimpleTlv::read(source)?);
    }
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::source::IoSource;

    #[test]
    fn test_short_and_long_lengths() {
        let short = SimpleTlv::new(0x01, vec![0xAA; 0xFE]).unwrap();
        assert_eq!(short.length_width(), 1);
        assert_eq!(&short.to_bytes()[..2], &[0x01, 0xFE]);

        let long = SimpleTlv::new(0x02, vec![0xBB; 0xFF]).unwrap();
        assert_eq!(long.length_width(), 3);
        assert_eq!(&long.to_bytes()[..4], &[0x02, 0xFF, 0x00, 0xFF]);
        assert_eq!(long.to_bytes().len(), long.encoded_len());
    }

    #[test]
    fn test_decode_sequence() {
        let data = hex::decode("0102CAFE10FF0003010203").unwrap();
        let objects = decode_all(&data).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].tag(), 0x01);
        assert_eq!(objects[0].value(), &[0xCA, 0xFE]);
        assert_eq!(objects[1].tag(), 0x10);
        assert_eq!(objects[1].value(), &[0x01, 0x02, 0x03]);

        let mut source = IoSource::new(Cursor::new(data));
        assert_eq!(read_all(&mut source).unwrap(), objects);
    }

    #[test]
    fn test_write_appends() {
        let object = SimpleTlv::new(0x4F, vec![0xA0, 0x00]).unwrap();
        let mut buf = vec![0x99];
        object.write(&mut buf);
        assert_eq!(buf, vec![0x99, 0x4F, 0x02, 0xA0, 0x00]);
    }

    #[test]
    fn test_invalid_tags() {
        assert!(matches!(
            SimpleTlv::new(0x00, Vec::new()),
            Err(TlvError::InvalidSimpleTag(0x00))
        ));
        let data = [0xFF, 0x00];
        assert!(matches!(
            SimpleTlv::read(&mut data.as_slice()),
            Err(TlvError::InvalidSimpleTag(0xFF))
        ));
        assert!(matches!(
            decode_all(&[0x01, 0x00, 0x00, 0x00]),
            Err(TlvError::InvalidSimpleTag(0x00))
        ));
        assert!(SimpleTlv::new(0x01, vec![0u8; 0x1_0000]).is_err());
    }

    #[test]
    fn test_truncated_value() {
        let data = [0x05, 0x04, 0x01];
        assert!(SimpleTlv::read(&mut data.as_slice()).unwrap_err().is_eof());
        assert!(matches!(
            decode_all(&data),
            Err(TlvError::TruncatedOrOverrunTlv {
                declared: 4,
                consumed: 1
            })
        ));
        assert!(matches!(
            decode_all(&[0x05, 0xFF, 0x01, 0x00, 0xAA]),
            Err(TlvError::TruncatedOrOverrunTlv {
                declared: 0x100,
                consumed: 1
            })
        ));
    }
}
