//! APDU command definitions
//!
//! A [`Command`] is one logical command. It may be larger than a physical
//! frame; [`Framer`](crate::framer::Framer) decides how it goes on the wire.
//! [`Command::to_bytes`] renders the single-frame form (short, or extended
//! when a field does not fit).

use std::borrow::Cow;

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::limits::{HEADER_LEN, MAX_DATA_LEN, MAX_SHORT_LC, MAX_SHORT_LE};
use crate::{Error, Result};

/// Expected response length (Le)
///
/// `0` requests the maximum the frame allows: 256 bytes in a short frame,
/// 65536 in an extended one.
pub type ExpectedLength = u16;

/// Generic APDU command structure
#[derive(Debug, Clone, Eq)]
pub struct Command {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Command data (optional)
    pub data: Option<Bytes>,
    /// Expected length (optional)
    pub le: Option<ExpectedLength>,
    /// Label used in logs
    description: Cow<'static, str>,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
            description: Cow::Borrowed(""),
        }
    }

    /// Create a new command with expected response length (Le)
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: ExpectedLength) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: Some(le),
            description: Cow::Borrowed(""),
        }
    }

    /// Create a new command with data payload
    pub fn new_with_data<T: Into<Bytes>>(cla: u8, ins: u8, p1: u8, p2: u8, data: T) -> Self {
        Self::new(cla, ins, p1, p2).with_data(data)
    }

    /// Create a new command with both data and expected length
    pub fn new_with_data_and_le<T: Into<Bytes>>(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: T,
        le: ExpectedLength,
    ) -> Self {
        Self::new_with_le(cla, ins, p1, p2, le).with_data(data)
    }

    /// Set the data field
    ///
    /// Empty data is the same as no data.
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Self {
        let data = data.into();
        self.data = (!data.is_empty()).then_some(data);
        self
    }

    /// Set the expected length field
    pub const fn with_le(mut self, le: ExpectedLength) -> Self {
        self.le = Some(le);
        self
    }

    /// Attach a label for diagnostics
    pub fn with_description(mut self, description: impl Into<Cow<'static, str>>) -> Self {
        self.description = description.into();
        self
    }

    /// Label used in logs, empty if none was set
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Command header (CLA INS P1 P2)
    pub const fn header(&self) -> [u8; HEADER_LEN] {
        [self.cla, self.ins, self.p1, self.p2]
    }

    /// Command data, empty if absent
    pub fn data_bytes(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }

    /// Length of the command data (Lc), 0 if absent
    pub fn data_len(&self) -> usize {
        self.data.as_ref().map_or(0, Bytes::len)
    }

    /// Check whether Lc or Le cannot be written in a short frame
    pub fn needs_extended(&self) -> bool {
        self.data_len() > MAX_SHORT_LC || self.le.is_some_and(|le| le > MAX_SHORT_LE)
    }

    /// Render the command as one physical frame
    ///
    /// Uses extended fields only when [`needs_extended`](Self::needs_extended);
    /// then both Lc and Le are extended.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let len = self.data_len();
        if len > MAX_DATA_LEN {
            return Err(Error::DataTooLong {
                len,
                max: MAX_DATA_LEN,
            });
        }

        if self.needs_extended() {
            Ok(encode_extended(self.header(), self.data_bytes(), self.le))
        } else {
            Ok(encode_short(self.header(), self.data_bytes(), self.le))
        }
    }

    /// Parse a command from raw bytes
    ///
    /// Accepts every short (1, 2S, 3S, 4S) and extended (2E, 3E, 4E) case.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let invalid = || Error::InvalidCommandLength(data.len());

        let [cla, ins, p1, p2, body @ ..] = data else {
            return Err(invalid());
        };
        let mut command = Self::new(*cla, *ins, *p1, *p2);

        match body {
            [] => {}
            [le] => command.le = Some(ExpectedLength::from(*le)),
            [0x00, hi, lo] => command.le = Some(u16::from_be_bytes([*hi, *lo])),
            [0x00, hi, lo, rest @ ..] => {
                let lc = usize::from(u16::from_be_bytes([*hi, *lo]));
                if lc == 0 {
                    return Err(invalid());
                }
                match rest.len().checked_sub(lc) {
                    Some(0) => {}
                    Some(2) => command.le = Some(u16::from_be_bytes([rest[lc], rest[lc + 1]])),
                    _ => return Err(invalid()),
                }
                command.data = Some(Bytes::copy_from_slice(&rest[..lc]));
            }
            [lc, rest @ ..] => {
                let lc = usize::from(*lc);
                if lc == 0 {
                    return Err(invalid());
                }
                match rest.len().checked_sub(lc) {
                    Some(0) => {}
                    Some(1) => command.le = Some(ExpectedLength::from(rest[lc])),
                    _ => return Err(invalid()),
                }
                command.data = Some(Bytes::copy_from_slice(&rest[..lc]));
            }
        }

        Ok(command)
    }
}

impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.header() == other.header() && self.data == other.data && self.le == other.le
    }
}

/// Encode a short frame: `CLA INS P1 P2 [Lc data] [Le]`
///
/// The caller guarantees `data.len() <= 255` and `le <= 255`.
pub(crate) fn encode_short(
    header: [u8; HEADER_LEN],
    data: &[u8],
    le: Option<ExpectedLength>,
) -> Bytes {
    let mut buffer = BytesMut::with_capacity(HEADER_LEN + 2 + data.len());
    buffer.put_slice(&header);

    if !data.is_empty() {
        buffer.put_u8(data.len() as u8);
        buffer.put_slice(data);
    }

    if let Some(le) = le {
        buffer.put_u8(le as u8);
    }

    buffer.freeze()
}

/// Encode an extended frame: `CLA INS P1 P2 [00 LcHi LcLo data] [[00] LeHi LeLo]`
///
/// Le follows ISO/IEC 7816-4: case 4E writes it as two bytes after the data,
/// since the `00` in front of Lc already marks the frame as extended; case 2E
/// has no Lc and writes `00 LeHi LeLo`. Cards reject a third Le byte in
/// case 4E, so the two forms are intentionally different.
///
/// The caller guarantees `data.len() <= 65535`.
pub(crate) fn encode_extended(
    header: [u8; HEADER_LEN],
    data: &[u8],
    le: Option<ExpectedLength>,
) -> Bytes {
    let mut buffer = BytesMut::with_capacity(HEADER_LEN + 5 + data.len());
    buffer.put_slice(&header);

    if !data.is_empty() {
        buffer.put_u8(0x00);
        buffer.put_u16(data.len() as u16);
        buffer.put_slice(data);
    }

    if let Some(le) = le {
        // Without Lc the extended Le carries its own 00 marker
        if data.is_empty() {
            buffer.put_u8(0x00);
        }
        buffer.put_u16(le);
    }

    buffer.freeze()
}
