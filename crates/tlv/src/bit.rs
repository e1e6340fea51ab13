//! Biometric Information Template (ISO/IEC 7816-11)
//!
//! A match-on-card applet describes the matcher it expects through a BIT
//! group:
//!
//! ```text
//! 7F61 BIT group
//!     02   number of BITs (1 or 2)
//!     7F60 BIT
//!         A1 Biometric Header Template
//!             81 biometric type      (optional)
//!             82 biometric subtype   (optional)
//!             87 format owner
//!             88 format type
//!             B1 algorithm parameters
//!                 81 min/max minutiae
//!                 82 minutiae order
//!                 83 feature handling (optional)
//! ```
//!
//! Objects may appear in any order and unknown objects are ignored.

use core::fmt;

use bytes::Bytes;

use crate::error::TlvError;
use crate::node::TlvNode;
use crate::tags;

/// Errors produced while reading a BIT out of a TLV tree
#[derive(Debug, thiserror::Error)]
pub enum BitError {
    /// A required data object is absent
    #[error("Missing data object {0:#X}")]
    MissingObject(u32),

    /// A data object has the wrong size or is not primitive
    #[error("Invalid value in data object {0:#X}")]
    InvalidValue(u32),

    /// A BIT group holds something other than a BIT where one is expected
    #[error("Unexpected data object {0:#X} in BIT group")]
    UnexpectedObject(u32),

    /// The group announces a number of BITs other than 1 or 2
    #[error("Invalid number of BITs: {0}")]
    InvalidCount(u8),

    /// Error building a TLV tree
    #[error(transparent)]
    Tlv(#[from] TlvError),
}

/// Decoded Biometric Information Template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiometricInfoTemplate {
    /// Biometric type, e.g. [`tags::BIOMETRIC_TYPE_FINGERPRINT`]
    pub biometric_type: Option<u8>,
    /// Biometric subtype (finger position)
    pub biometric_subtype: Option<u8>,
    /// CBEFF format owner
    pub format_owner: u16,
    /// CBEFF format type
    pub format_type: u16,
    /// Fewest minutiae the matcher accepts
    pub min_minutiae: u8,
    /// Most minutiae the matcher accepts
    pub max_minutiae: u8,
    /// Required minutiae ordering
    pub minutiae_order: u8,
    /// Feature handling indicator
    pub feature_handling: Option<u8>,
}

fn required<'a>(parent: &'a TlvNode, tag: u32) -> Result<&'a TlvNode, BitError> {
    parent.find_child(tag).ok_or(BitError::MissingObject(tag))
}

fn bytes_of<const N: usize>(node: &TlvNode) -> Result<[u8; N], BitError> {
    let tag = node.tag().raw();
    node.data()
        .and_then(|data| data[..].try_into().ok())
        .ok_or(BitError::InvalidValue(tag))
}

fn optional_byte(parent: &TlvNode, tag: u32) -> Result<Option<u8>, BitError> {
    parent
        .find_child(tag)
        .map(|node| bytes_of::<1>(node).map(|[byte]| byte))
        .transpose()
}

impl BiometricInfoTemplate {
    /// Read a BIT (`7F60`) object
    pub fn from_tlv(bit: &TlvNode) -> Result<Self, BitError> {
        let bht = required(bit, tags::BHT)?;
        let params = required(bht, tags::ALGORITHM_PARAMETERS)?;
        let [min_minutiae, max_minutiae] = bytes_of(required(params, tags::MIN_MAX_MINUTIAE)?)?;
        let [minutiae_order] = bytes_of(required(params, tags::MINUTIAE_ORDER)?)?;

        Ok(Self {
            biometric_type: optional_byte(bht, tags::BIOMETRIC_TYPE)?,
            biometric_subtype: optional_byte(bht, tags::BIOMETRIC_SUBTYPE)?,
            format_owner: u16::from_be_bytes(bytes_of(required(bht, tags::FORMAT_OWNER)?)?),
            format_type: u16::from_be_bytes(bytes_of(required(bht, tags::FORMAT_TYPE)?)?),
            min_minutiae,
            max_minutiae,
            minutiae_order,
            feature_handling: optional_byte(params, tags::FEATURE_HANDLING)?,
        })
    }

    /// Build the BIT (`7F60`) object describing this template
    pub fn to_tlv(&self) -> Result<TlvNode, BitError> {
        let mut params = TlvNode::constructed(
            tags::ALGORITHM_PARAMETERS,
            [
                TlvNode::primitive(
                    tags::MIN_MAX_MINUTIAE,
                    vec![self.min_minutiae, self.max_minutiae],
                )?,
                TlvNode::primitive(tags::MINUTIAE_ORDER, vec![self.minutiae_order])?,
            ],
        )?;
        if let Some(handling) = self.feature_handling {
            params.attach(TlvNode::primitive(tags::FEATURE_HANDLING, vec![handling])?)?;
        }

        let mut bht = TlvNode::with_tag(tags::BHT)?;
        if let Some(kind) = self.biometric_type {
            bht.attach(TlvNode::primitive(tags::BIOMETRIC_TYPE, vec![kind])?)?;
        }
        if let Some(subtype) = self.biometric_subtype {
            bht.attach(TlvNode::primitive(tags::BIOMETRIC_SUBTYPE, vec![subtype])?)?;
        }
        bht.attach(TlvNode::primitive(
            tags::FORMAT_OWNER,
            self.format_owner.to_be_bytes().to_vec(),
        )?)?;
        bht.attach(TlvNode::primitive(
            tags::FORMAT_TYPE,
            self.format_type.to_be_bytes().to_vec(),
        )?)?;
        bht.attach(params)?;

        TlvNode::constructed(tags::BIT, [bht]).map_err(BitError::from)
    }
}

impl fmt::Display for BiometricInfoTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.biometric_type {
            Some(kind) => writeln!(f, "Biometric Type: {kind}")?,
            None => writeln!(f, "Biometric Type: Not present")?,
        }
        match self.biometric_subtype {
            Some(subtype) => writeln!(f, "Biometric Subtype: {subtype}")?,
            None => writeln!(f, "Biometric Subtype: Not present")?,
        }
        writeln!(f, "CBEFF: 0x{:04X}:{:04X}", self.format_owner, self.format_type)?;
        writeln!(f, "Minutiae min/max: {}:{}", self.min_minutiae, self.max_minutiae)?;
        writeln!(f, "Minutiae Order: 0x{:02X}", self.minutiae_order)?;
        match self.feature_handling {
            Some(handling) => writeln!(f, "Feature Handling: 0x{handling:02X}"),
            None => writeln!(f, "Feature Handling: Not present"),
        }
    }
}

/// Read every BIT from a BIT group (`7F61`)
///
/// The first child carries the number of BITs that follow it.
pub fn bits_from_group(group: &TlvNode) -> Result<Vec<BiometricInfoTemplate>, BitError> {
    let mut children = group.children().iter();
    let count_object = children
        .next()
        .filter(|child| child.tag().raw() == tags::BIT_COUNT)
        .ok_or(BitError::MissingObject(tags::BIT_COUNT))?;
    let [count] = bytes_of(count_object)?;
    if !matches!(count, 1 | 2) {
        return Err(BitError::InvalidCount(count));
    }

    (0..count)
        .map(|_| {
            children
                .next()
                .ok_or(BitError::MissingObject(tags::BIT))
                .and_then(|child| match child.tag().raw() {
                    tags::BIT => BiometricInfoTemplate::from_tlv(child),
                    other => Err(BitError::UnexpectedObject(other)),
                })
        })
        .collect()
}

/// Build the biometric data template `7F2E { 81 <minutiae> }` sent to
/// store or verify a fingerprint
pub fn minutiae_template(minutiae: impl Into<Bytes>) -> Result<TlvNode, TlvError> {
    TlvNode::constructed(
        tags::BIOMETRIC_DATA_TEMPLATE,
        [TlvNode::primitive(tags::FINGER_MINUTIAE, minutiae)?],
    )
}
