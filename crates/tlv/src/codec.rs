//! BER-TLV decoding and encoding

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::error::{Result, TlvError};
use crate::length;
use crate::node::{TlvNode, TlvValue};
use crate::source::ByteSource;
use crate::tag::Tag;

/// Deepest nesting of constructed objects the decoder follows
pub const MAX_DEPTH: usize = 32;

/// Decode one TLV object, and all of its descendants, from `source`
///
/// The children of a constructed object must fill its declared length
/// exactly. Any error discards the partially decoded tree.
pub fn decode<S: ByteSource + ?Sized>(source: &mut S) -> Result<TlvNode> {
    let node = decode_nested(source, 0)?;
    trace!(tag = %node.tag(), length = node.length(), "Decoded TLV");
    Ok(node)
}

fn decode_nested<S: ByteSource + ?Sized>(source: &mut S, depth: usize) -> Result<TlvNode> {
    if depth >= MAX_DEPTH {
        return Err(TlvError::NestingTooDeep(MAX_DEPTH));
    }

    let tag = Tag::read(source)?;
    let (length, length_width) = length::read(source)?;

    let value = if tag.is_constructed() {
        let declared = u64::from(length);
        let mut consumed = 0u64;
        let mut children = Vec::new();
        while consumed < declared {
            let child = decode_nested(source, depth + 1)?;
            consumed += child.encoded_len();
            if consumed > declared {
                return Err(TlvError::TruncatedOrOverrunTlv {
                    declared: length,
                    consumed,
                });
            }
            children.push(child);
        }
        TlvValue::Constructed(children)
    } else {
        TlvValue::Primitive(source.read_bytes(length as usize)?)
    };

    Ok(TlvNode::from_wire(tag, length, length_width, value))
}

/// Decode consecutive sibling objects until the input is exhausted
pub fn decode_all<S: ByteSource + ?Sized>(source: &mut S) -> Result<Vec<TlvNode>> {
    let mut nodes = Vec::new();
    while !source.is_exhausted()? {
        nodes.push(decode(source)?);
    }
    Ok(nodes)
}

impl TlvNode {
    /// Decode a single object from an in-memory buffer
    ///
    /// Primitive values share the buffer rather than copying it. Bytes left
    /// over after the object are ignored.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        let mut data = data.into();
        decode(&mut data)
    }

    /// Append the encoding of this object to `buf`
    pub fn encode_into<B: BufMut + ?Sized>(&self, buf: &mut B) {
        self.tag().write(buf);
        length::write(buf, self.length(), self.length_width());
        match self.value() {
            TlvValue::Primitive(data) => buf.put_slice(data),
            TlvValue::Constructed(children) => {
                for child in children {
                    child.encode_into(buf);
                }
            }
        }
    }

    /// Encode this object into a new buffer
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len() as usize);
        self.encode_into(&mut buf);
        buf.freeze()
    }
}
