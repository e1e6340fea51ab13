//! BER-TLV and Simple-TLV codec for ISO/IEC 7816-4 data objects
//!
//! Smart cards return biometric templates, identifiers and capability objects
//! as nested tag-length-value trees. This crate provides:
//!
//! - [`TlvNode`], an owned tree that keeps declared lengths consistent as
//!   children are attached or modified
//! - [`decode`] / [`TlvNode::to_bytes`] for BER-TLV over any [`ByteSource`]
//!   (slices, [`Bytes`], or buffered readers through [`IoSource`])
//! - [`simple::SimpleTlv`] for the single-byte-tag Simple-TLV format
//! - [`bit`] for reading Biometric Information Templates out of a decoded tree
//!
//! ```
//! use biocard_tlv::{TlvNode, tags};
//!
//! let mut bht = TlvNode::with_tag(tags::BHT)?;
//! bht.attach(TlvNode::primitive(tags::FORMAT_OWNER, vec![0x01, 0x01])?)?;
//!
//! let encoded = bht.to_bytes();
//! assert_eq!(encoded.as_ref(), &[0xA1, 0x04, 0x87, 0x02, 0x01, 0x01]);
//! assert_eq!(TlvNode::from_bytes(encoded)?, bht);
//! # Ok::<(), biocard_tlv::TlvError>(())
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub use bytes::Bytes;

pub mod bit;
mod codec;
mod error;
pub mod length;
mod node;
pub mod simple;
mod source;
pub mod tag;
pub mod tags;

pub use codec::{MAX_DEPTH, decode, decode_all};
pub use error::{Result, TlvError};
pub use node::{TlvNode, TlvValue};
pub use source::{ByteSource, IoSource};
pub use tag::{Tag, TagClass};

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_decode_from_reader() {
        let data = hex::decode("53037F2E00A100").unwrap();
        let mut source = IoSource::new(Cursor::new(data));

        let nodes = decode_all(&mut source).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].tag().raw(), tags::DISCRETIONARY_DATA);
        assert_eq!(nodes[0].data().unwrap().as_ref(), &[0x7F, 0x2E, 0x00]);
        assert_eq!(source.position(), 7);
    }
}
