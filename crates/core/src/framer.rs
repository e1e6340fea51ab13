//! Command framer
//!
//! Splits a logical [`Command`] into the physical frames sent to the card:
//! a single short frame, a run of short frames linked by the CLA chaining
//! bit, or a single extended frame.

use bytes::Bytes;
use derive_more::Display;
use tracing::debug;

use crate::command::{Command, encode_extended, encode_short};
use crate::config::{ExchangeConfig, FramingMode};
use crate::constants::cla;
use crate::constants::limits::{HEADER_LEN, MAX_DATA_LEN, MAX_SHORT_LC, MAX_SHORT_LE, TRAILER_LEN};
use crate::{Error, Result};

/// How one command was put on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TransmissionMode {
    /// One short frame
    Short,
    /// Several short frames, all but the last with the chaining bit set
    Chained,
    /// One frame with extended Lc/Le fields
    Extended,
}

/// Frames rendered for one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    /// Selected transmission mode
    pub mode: TransmissionMode,
    /// Physical frames in transmission order
    pub frames: Vec<Bytes>,
}

/// Renders commands into physical frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Framer {
    framing: FramingMode,
    max_short_lc: Option<usize>,
}

impl Framer {
    /// Create a framer for the given mode, deriving slice sizes per command
    pub const fn new(framing: FramingMode) -> Self {
        Self {
            framing,
            max_short_lc: None,
        }
    }

    /// Create a framer from an exchange configuration
    pub const fn from_config(config: &ExchangeConfig) -> Self {
        Self {
            framing: config.framing,
            max_short_lc: config.max_short_lc,
        }
    }

    /// Fix the number of data bytes per chained frame
    pub const fn with_max_short_lc(mut self, max_short_lc: usize) -> Self {
        self.max_short_lc = Some(max_short_lc);
        self
    }

    /// Largest data slice carried by one short frame for this command
    ///
    /// Without an override this is 255 less the header, the trailer, and
    /// one byte each for the Lc and Le fields the command uses.
    pub fn max_short_lc(&self, command: &Command) -> usize {
        self.max_short_lc.unwrap_or_else(|| {
            MAX_SHORT_LC
                - HEADER_LEN
                - TRAILER_LEN
                - usize::from(command.data.is_some())
                - usize::from(command.le.is_some())
        })
    }

    /// Render the frames for `command`
    pub fn plan(&self, command: &Command) -> Result<FramePlan> {
        let len = command.data_len();
        if len > MAX_DATA_LEN {
            return Err(Error::DataTooLong {
                len,
                max: MAX_DATA_LEN,
            });
        }
        if matches!(self.max_short_lc, Some(lc) if lc == 0 || lc > MAX_SHORT_LC) {
            return Err(Error::InvalidConfig("max_short_lc must be within 1..=255"));
        }

        let plan = match self.framing {
            FramingMode::Auto if command.needs_extended() => Self::extended(command),
            FramingMode::Auto => self.chained(command),
            FramingMode::Chained => match command.le {
                Some(le) if le > MAX_SHORT_LE => return Err(Error::InvalidExpectedLength(le)),
                _ => self.chained(command),
            },
            FramingMode::Extended if command.needs_extended() => Self::extended(command),
            FramingMode::Extended => FramePlan {
                mode: TransmissionMode::Short,
                frames: vec![encode_short(command.header(), command.data_bytes(), command.le)],
            },
        };

        debug!(
            framing = %self.framing,
            mode = %plan.mode,
            lc = len,
            le = ?command.le,
            frames = plan.frames.len(),
            "Framed command"
        );

        Ok(plan)
    }

    fn extended(command: &Command) -> FramePlan {
        FramePlan {
            mode: TransmissionMode::Extended,
            frames: vec![encode_extended(
                command.header(),
                command.data_bytes(),
                command.le,
            )],
        }
    }

    fn chained(&self, command: &Command) -> FramePlan {
        let header = command.header();
        let data = command.data_bytes();
        let max = self.max_short_lc(command);

        if data.len() <= max {
            return FramePlan {
                mode: TransmissionMode::Short,
                frames: vec![encode_short(header, data, command.le)],
            };
        }

        let mut frames = Vec::with_capacity(data.len().div_ceil(max));
        let mut slices = data.chunks(max).peekable();
        while let Some(slice) = slices.next() {
            let mut frame_header = header;
            if slices.peek().is_some() {
                frame_header[0] |= cla::CHAINING;
                frames.push(encode_short(frame_header, slice, None));
            } else {
                frame_header[0] &= !cla::CHAINING;
                frames.push(encode_short(frame_header, slice, command.le));
            }
        }

        FramePlan {
            mode: TransmissionMode::Chained,
            frames,
        }
    }
}
