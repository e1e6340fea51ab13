//! In-memory TLV tree
//!
//! A [`TlvNode`] owns its primitive value or its children outright, so
//! dropping the root releases the whole tree. The declared length of a
//! constructed node always equals the encoded size of its children: every
//! mutation goes through a method that performs the length fixup.

use core::fmt;

use bytes::Bytes;

use crate::error::{Result, TlvError};
use crate::length;
use crate::tag::{Tag, TagClass};

/// Value part of a TLV object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvValue {
    /// Raw bytes of a primitive object
    Primitive(Bytes),
    /// Ordered children of a constructed object
    Constructed(Vec<TlvNode>),
}

/// One tag-length-value object, possibly with nested children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvNode {
    tag: Tag,
    length: u32,
    length_width: u8,
    value: TlvValue,
}

fn checked_length(length: u64) -> Result<u32> {
    u32::try_from(length).map_err(|_| TlvError::LengthOverflow(length))
}

impl TlvNode {
    /// Create an empty object for `tag`
    ///
    /// The node is constructed or primitive according to bit 6 of the tag.
    pub fn new(tag: Tag) -> Self {
        let value = if tag.is_constructed() {
            TlvValue::Constructed(Vec::new())
        } else {
            TlvValue::Primitive(Bytes::new())
        };
        Self {
            tag,
            length: 0,
            length_width: 1,
            value,
        }
    }

    /// Create an empty object from an encoded tag value such as `0x7F61`
    pub fn with_tag(raw: u32) -> Result<Self> {
        Ok(Self::new(Tag::new(raw)?))
    }

    /// Create a primitive object holding `value`
    pub fn primitive(tag: u32, value: impl Into<Bytes>) -> Result<Self> {
        let mut node = Self::with_tag(tag)?;
        node.set_value(value)?;
        Ok(node)
    }

    /// Create a constructed object and attach `children` in order
    pub fn constructed(tag: u32, children: impl IntoIterator<Item = Self>) -> Result<Self> {
        let mut node = Self::with_tag(tag)?;
        for child in children {
            node.attach(child)?;
        }
        Ok(node)
    }

    /// Assemble a node read from the wire, keeping the width of its length field
    pub(crate) const fn from_wire(tag: Tag, length: u32, length_width: u8, value: TlvValue) -> Self {
        Self {
            tag,
            length,
            length_width,
            value,
        }
    }

    /// Tag of this object
    pub const fn tag(&self) -> Tag {
        self.tag
    }

    /// Tag class
    pub const fn class(&self) -> TagClass {
        self.tag.class()
    }

    /// Whether this object holds children
    pub const fn is_constructed(&self) -> bool {
        matches!(self.value, TlvValue::Constructed(_))
    }

    /// Declared length of the value in bytes
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Width in bytes of the encoded tag field
    pub const fn tag_width(&self) -> u8 {
        self.tag.width()
    }

    /// Width in bytes of the encoded length field
    pub const fn length_width(&self) -> u8 {
        self.length_width
    }

    /// Total encoded size: tag field, length field and value
    pub const fn encoded_len(&self) -> u64 {
        self.tag.width() as u64 + self.length_width as u64 + self.length as u64
    }

    /// Value of this object
    pub const fn value(&self) -> &TlvValue {
        &self.value
    }

    /// Primitive value bytes, if this object is primitive
    pub const fn data(&self) -> Option<&Bytes> {
        match &self.value {
            TlvValue::Primitive(data) => Some(data),
            TlvValue::Constructed(_) => None,
        }
    }

    /// Children in insertion order; empty for primitive objects
    pub fn children(&self) -> &[Self] {
        match &self.value {
            TlvValue::Constructed(children) => children,
            TlvValue::Primitive(_) => &[],
        }
    }

    /// Append `child` and grow the declared length by the child's encoded size
    pub fn attach(&mut self, child: Self) -> Result<()> {
        let TlvValue::Constructed(children) = &mut self.value else {
            return Err(TlvError::NotConstructed(self.tag.raw()));
        };
        let length = checked_length(u64::from(self.length) + child.encoded_len())?;
        children.push(child);
        self.set_length(length);
        Ok(())
    }

    /// Replace the primitive value and set the length to match
    pub fn set_value(&mut self, value: impl Into<Bytes>) -> Result<()> {
        if !matches!(self.value, TlvValue::Primitive(_)) {
            return Err(TlvError::NotPrimitive(self.tag.raw()));
        }
        let value = value.into();
        let length = checked_length(value.len() as u64)?;
        self.value = TlvValue::Primitive(value);
        self.set_length(length);
        Ok(())
    }

    /// Mutate the child at `index` in place
    ///
    /// The length of this node is re-derived once the closure returns, so
    /// nested calls fix up every ancestor along the path.
    pub fn modify_child<R>(&mut self, index: usize, f: impl FnOnce(&mut Self) -> R) -> Result<R> {
        let TlvValue::Constructed(children) = &mut self.value else {
            return Err(TlvError::NotConstructed(self.tag.raw()));
        };
        let child = children
            .get_mut(index)
            .ok_or(TlvError::NoSuchChild(index))?;
        let result = f(child);
        self.refresh_length()?;
        Ok(result)
    }

    /// Remove and return the child at `index`, shrinking the declared length
    pub fn remove_child(&mut self, index: usize) -> Result<Self> {
        let TlvValue::Constructed(children) = &mut self.value else {
            return Err(TlvError::NotConstructed(self.tag.raw()));
        };
        if index >= children.len() {
            return Err(TlvError::NoSuchChild(index));
        }
        let child = children.remove(index);
        self.refresh_length()?;
        Ok(child)
    }

    fn refresh_length(&mut self) -> Result<()> {
        let total = match &self.value {
            TlvValue::Constructed(children) => children.iter().map(Self::encoded_len).sum(),
            TlvValue::Primitive(data) => data.len() as u64,
        };
        let length = checked_length(total)?;
        self.set_length(length);
        Ok(())
    }

    const fn set_length(&mut self, length: u32) {
        self.length = length;
        self.length_width = length::width_for(length);
    }

    /// First direct child with the given encoded tag
    pub fn find_child(&self, tag: u32) -> Option<&Self> {
        self.children().iter().find(|child| child.tag.raw() == tag)
    }

    /// Depth-first search of this node and its descendants
    pub fn find(&self, tag: u32) -> Option<&Self> {
        if self.tag.raw() == tag {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(tag))
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(
            f,
            "{:indent$}TAG {}, Length {}, Value",
            "",
            self.tag,
            self.length,
            indent = depth * 4
        )?;
        match &self.value {
            TlvValue::Primitive(data) => writeln!(f, " 0x{}", hex::encode_upper(data)),
            TlvValue::Constructed(children) => {
                writeln!(f)?;
                children
                    .iter()
                    .try_for_each(|child| child.fmt_indented(f, depth + 1))
            }
        }
    }
}

impl fmt::Display for TlvNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_kind_from_tag() {
        let node = TlvNode::with_tag(0x7F61).unwrap();
        assert!(node.is_constructed());
        assert_eq!(node.length(), 0);
        assert_eq!(node.tag_width(), 2);
        assert_eq!(node.length_width(), 1);

        let node = TlvNode::with_tag(0x81).unwrap();
        assert!(!node.is_constructed());
        assert_eq!(node.data().unwrap().len(), 0);
    }

    #[test]
    fn test_attach_fixup_grows_length_field() {
        let mut parent = TlvNode::with_tag(0xA1).unwrap();
        // 3 children of 2 + 64 + 2 + 64 + 2 + 66 = 200 bytes
        parent
            .attach(TlvNode::primitive(0x81, vec![0u8; 64]).unwrap())
            .unwrap();
        parent
            .attach(TlvNode::primitive(0x82, vec![0u8; 64]).unwrap())
            .unwrap();
        assert_eq!(parent.length(), 132);
        assert_eq!(parent.length_width(), 2);
        parent
            .attach(TlvNode::primitive(0x83, vec![0u8; 66]).unwrap())
            .unwrap();

        assert_eq!(parent.length(), 200);
        assert_eq!(parent.length_width(), 2);
        assert_eq!(parent.children().len(), 3);
    }

    #[test]
    fn test_attach_to_primitive_fails() {
        let mut node = TlvNode::primitive(0x81, vec![0x01]).unwrap();
        let child = TlvNode::primitive(0x82, vec![0x02]).unwrap();
        assert!(matches!(
            node.attach(child),
            Err(TlvError::NotConstructed(0x81))
        ));

        let mut node = TlvNode::with_tag(0xA1).unwrap();
        assert!(matches!(
            node.set_value(vec![0x01]),
            Err(TlvError::NotPrimitive(0xA1))
        ));
    }

    #[test]
    fn test_modify_child_propagates_to_ancestors() {
        let inner = TlvNode::constructed(0xB1, [TlvNode::primitive(0x81, vec![1]).unwrap()])
            .unwrap();
        let middle = TlvNode::constructed(0xA1, [inner]).unwrap();
        let mut root = TlvNode::constructed(0x7F60, [middle]).unwrap();
        assert_eq!(root.length(), 7);

        root.modify_child(0, |middle| {
            middle
                .modify_child(0, |inner| {
                    inner
                        .attach(TlvNode::primitive(0x82, vec![0u8; 200]).unwrap())
                        .unwrap()
                })
                .unwrap()
        })
        .unwrap();

        let middle = &root.children()[0];
        let inner = &middle.children()[0];
        assert_eq!(inner.length(), 3 + 3 + 200);
        assert_eq!(inner.length_width(), 2);
        assert_eq!(middle.length(), 1 + 2 + 206);
        assert_eq!(root.length(), 1 + 2 + 209);
        assert_eq!(root.length_width(), 2);
    }

    #[test]
    fn test_remove_child() {
        let mut node = TlvNode::constructed(
            0xA1,
            [
                TlvNode::primitive(0x81, vec![1]).unwrap(),
                TlvNode::primitive(0x82, vec![2, 3]).unwrap(),
            ],
        )
        .unwrap();
        let removed = node.remove_child(0).unwrap();
        assert_eq!(removed.tag().raw(), 0x81);
        assert_eq!(node.length(), 4);
        assert!(matches!(node.remove_child(5), Err(TlvError::NoSuchChild(5))));
    }

    #[test]
    fn test_find() {
        let node = TlvNode::constructed(
            0x7F60,
            [TlvNode::constructed(
                0xA1,
                [
                    TlvNode::primitive(0x87, vec![0x01, 0x01]).unwrap(),
                    TlvNode::primitive(0x88, vec![0x00, 0x07]).unwrap(),
                ],
            )
            .unwrap()],
        )
        .unwrap();

        assert!(node.find_child(0x88).is_none());
        assert_eq!(
            node.find(0x88).unwrap().data().unwrap().as_ref(),
            &[0x00, 0x07]
        );
        assert_eq!(node.find(0x7F60), Some(&node));
    }

    #[test]
    fn test_display_tree() {
        let node = TlvNode::constructed(
            0x7F61,
            [
                TlvNode::primitive(0x02, vec![0x01]).unwrap(),
                TlvNode::constructed(0xA1, [TlvNode::primitive(0x81, vec![0x08]).unwrap()])
                    .unwrap(),
            ],
        )
        .unwrap();

        let expected = "TAG 0x7F61, Length 8, Value\n\
                        \x20   TAG 0x02, Length 1, Value 0x01\n\
                        \x20   TAG 0xA1, Length 3, Value\n\
                        \x20       TAG 0x81, Length 1, Value 0x08\n";
        assert_eq!(node.to_string(), expected);
    }
}
